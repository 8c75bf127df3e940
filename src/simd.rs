//! Squared Euclidean kernels with 4-wide SIMD acceleration.
//!
//! | Precision | x86_64 | aarch64 | Other |
//! |-----------|--------|---------|-------|
//! | `f32` | SSE (baseline) | NEON | portable |
//! | `f64` | AVX (runtime detected) | portable | portable |
//!
//! Every path keeps four independent lane accumulators, reduces them as
//! `(l0 + l1) + (l2 + l3)` and then adds the scalar tail in order. The portable
//! code follows the same sequence without fused multiply-add, so the SIMD and
//! portable paths return bit-identical sums. Rankings therefore never depend on
//! which instruction set the host happens to have.
//!
//! ```rust
//! use quantpivot::simd::{l2_distance_squared_f32, l2_distance_squared_f64};
//!
//! let a = [0.0_f32, 0.0, 0.0, 0.0];
//! let b = [3.0_f32, 4.0, 0.0, 0.0];
//! assert_eq!(l2_distance_squared_f32(&a, &b), 25.0);
//!
//! let c = [1.0_f64, 1.0];
//! let d = [0.0_f64, 0.0];
//! assert_eq!(l2_distance_squared_f64(&c, &d), 2.0);
//! ```

/// Lane count shared by every kernel (and by the row padding of [`crate::Matrix`]).
pub const LANES: usize = 4;

macro_rules! portable_l2_squared {
    ($name:ident, $t:ty) => {
        /// Squared L2 distance, portable 4-lane implementation.
        #[inline]
        #[must_use]
        pub fn $name(a: &[$t], b: &[$t]) -> $t {
            debug_assert_eq!(a.len(), b.len());
            let n = a.len().min(b.len());
            let chunks = n / LANES;
            let mut acc = [0.0 as $t; LANES];

            for c in 0..chunks {
                let base = c * LANES;
                for (lane, slot) in acc.iter_mut().enumerate() {
                    let d = a[base + lane] - b[base + lane];
                    *slot += d * d;
                }
            }

            let mut sum = (acc[0] + acc[1]) + (acc[2] + acc[3]);
            for i in chunks * LANES..n {
                let d = a[i] - b[i];
                sum += d * d;
            }
            sum
        }
    };
}

portable_l2_squared!(l2_distance_squared_f32_portable, f32);
portable_l2_squared!(l2_distance_squared_f64_portable, f64);

/// Squared L2 distance between two `f32` vectors.
#[inline]
#[must_use]
pub fn l2_distance_squared_f32(a: &[f32], b: &[f32]) -> f32 {
    #[cfg(all(target_arch = "x86_64", target_feature = "sse"))]
    {
        // SSE is part of the x86_64 baseline.
        unsafe { x86_64::l2_distance_squared_sse(a, b) }
    }
    #[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
    {
        unsafe { aarch64::l2_distance_squared_neon(a, b) }
    }
    #[cfg(not(any(
        all(target_arch = "x86_64", target_feature = "sse"),
        all(target_arch = "aarch64", target_feature = "neon")
    )))]
    {
        l2_distance_squared_f32_portable(a, b)
    }
}

/// Squared L2 distance between two `f64` vectors.
#[inline]
#[must_use]
pub fn l2_distance_squared_f64(a: &[f64], b: &[f64]) -> f64 {
    #[cfg(target_arch = "x86_64")]
    {
        if std::arch::is_x86_feature_detected!("avx") {
            return unsafe { x86_64::l2_distance_squared_avx(a, b) };
        }
    }
    l2_distance_squared_f64_portable(a, b)
}

#[cfg(target_arch = "x86_64")]
pub mod x86_64 {
    //! SSE (`f32`) and AVX (`f64`) kernels.

    use super::LANES;

    /// 4-wide SSE squared L2 distance.
    ///
    /// # Safety
    ///
    /// Requires SSE, which every x86_64 target has.
    #[inline]
    pub unsafe fn l2_distance_squared_sse(a: &[f32], b: &[f32]) -> f32 {
        use std::arch::x86_64::{
            _mm_add_ps, _mm_loadu_ps, _mm_mul_ps, _mm_setzero_ps, _mm_storeu_ps, _mm_sub_ps,
        };

        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let chunks = n / LANES;
        let mut acc = _mm_setzero_ps();

        for c in 0..chunks {
            let va = _mm_loadu_ps(a.as_ptr().add(c * LANES));
            let vb = _mm_loadu_ps(b.as_ptr().add(c * LANES));
            let d = _mm_sub_ps(va, vb);
            acc = _mm_add_ps(acc, _mm_mul_ps(d, d));
        }

        let mut lanes = [0.0f32; LANES];
        _mm_storeu_ps(lanes.as_mut_ptr(), acc);

        let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for i in chunks * LANES..n {
            let d = a[i] - b[i];
            sum += d * d;
        }
        sum
    }

    /// 4-wide AVX squared L2 distance.
    ///
    /// # Safety
    ///
    /// Requires AVX. Caller must verify via runtime detection.
    #[target_feature(enable = "avx")]
    pub unsafe fn l2_distance_squared_avx(a: &[f64], b: &[f64]) -> f64 {
        use std::arch::x86_64::{
            _mm256_add_pd, _mm256_loadu_pd, _mm256_mul_pd, _mm256_setzero_pd, _mm256_storeu_pd,
            _mm256_sub_pd,
        };

        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let chunks = n / LANES;
        let mut acc = _mm256_setzero_pd();

        for c in 0..chunks {
            let va = _mm256_loadu_pd(a.as_ptr().add(c * LANES));
            let vb = _mm256_loadu_pd(b.as_ptr().add(c * LANES));
            let d = _mm256_sub_pd(va, vb);
            acc = _mm256_add_pd(acc, _mm256_mul_pd(d, d));
        }

        let mut lanes = [0.0f64; LANES];
        _mm256_storeu_pd(lanes.as_mut_ptr(), acc);

        let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for i in chunks * LANES..n {
            let d = a[i] - b[i];
            sum += d * d;
        }
        sum
    }
}

#[cfg(all(target_arch = "aarch64", target_feature = "neon"))]
pub mod aarch64 {
    //! NEON kernel for `f32`.

    use super::LANES;

    /// 4-wide NEON squared L2 distance.
    ///
    /// # Safety
    ///
    /// NEON is always available on aarch64.
    #[inline]
    pub unsafe fn l2_distance_squared_neon(a: &[f32], b: &[f32]) -> f32 {
        use std::arch::aarch64::{vaddq_f32, vdupq_n_f32, vld1q_f32, vmulq_f32, vst1q_f32, vsubq_f32};

        debug_assert_eq!(a.len(), b.len());
        let n = a.len().min(b.len());
        let chunks = n / LANES;
        let mut acc = vdupq_n_f32(0.0);

        for c in 0..chunks {
            let va = vld1q_f32(a.as_ptr().add(c * LANES));
            let vb = vld1q_f32(b.as_ptr().add(c * LANES));
            let d = vsubq_f32(va, vb);
            // mul + add rather than fma, to match the portable rounding.
            acc = vaddq_f32(acc, vmulq_f32(d, d));
        }

        let mut lanes = [0.0f32; LANES];
        vst1q_f32(lanes.as_mut_ptr(), acc);

        let mut sum = (lanes[0] + lanes[1]) + (lanes[2] + lanes[3]);
        for i in chunks * LANES..n {
            let d = a[i] - b[i];
            sum += d * d;
        }
        sum
    }
}
