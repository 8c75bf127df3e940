//! Container files feeding fit/predict, and result files read back.

use std::fs;
use std::io::Write;

use quantpivot::container::{load_matrix, read_ids, save_elements, save_ids, save_matrix};
use quantpivot::{Matrix, QuantPivot, QuantPivotError};

#[test]
fn file_pipeline_matches_in_memory() {
    let dir = tempfile::tempdir().unwrap();
    let ds_path = dir.path().join("ds.ds2");
    let q_path = dir.path().join("query.ds2");
    let ids_path = dir.path().join("out_idnn.ds2");
    let dists_path = dir.path().join("out_distnn.ds2");

    let dataset =
        Matrix::<f32>::from_rows(&[[0.0, 0.0], [10.0, 0.0], [0.0, 10.0], [10.0, 10.0]]).unwrap();
    let queries = Matrix::<f32>::from_rows(&[[1.0, 1.0], [9.0, 8.0]]).unwrap();
    save_matrix(&ds_path, &dataset).unwrap();
    save_matrix(&q_path, &queries).unwrap();

    // 8-byte header + 4 * 2 * 4 bytes.
    assert_eq!(fs::metadata(&ds_path).unwrap().len(), 8 + 32);

    let loaded: Matrix<f32> = load_matrix(&ds_path).unwrap();
    assert_eq!(loaded, dataset);
    let loaded_q: Matrix<f32> = load_matrix(&q_path).unwrap();

    let mut engine = QuantPivot::sequential();
    engine.fit(loaded, 1, 4, true).unwrap();
    let neighbors = engine.predict(&loaded_q, 2, true).unwrap();

    assert_eq!(neighbors.ids_row(0), &[0, 1]);
    assert_eq!(neighbors.ids_row(1), &[3, 1]);

    save_ids(&ids_path, neighbors.ids(), 2, 2).unwrap();
    save_elements(&dists_path, neighbors.distances(), 2, 2).unwrap();

    let (ids, rows, cols) = read_ids(&mut fs::File::open(&ids_path).unwrap()).unwrap();
    assert_eq!((rows, cols), (2, 2));
    assert_eq!(ids, neighbors.ids());

    let dists: Matrix<f32> = load_matrix(&dists_path).unwrap();
    assert_eq!(dists.to_flat(), neighbors.distances());
}

#[test]
fn truncated_file_is_format_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.ds2");
    {
        let mut f = fs::File::create(&path).unwrap();
        f.write_all(&3i32.to_le_bytes()).unwrap();
        f.write_all(&2i32.to_le_bytes()).unwrap();
        for v in [1.0f64, 2.0, 3.0] {
            f.write_all(&v.to_le_bytes()).unwrap();
        }
    }

    let err = load_matrix::<f64, _>(&path).unwrap_err();
    assert!(matches!(err, QuantPivotError::Format(_)), "{err}");
    assert!(!err.is_configuration());
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = load_matrix::<f32, _>(dir.path().join("nope.ds2")).unwrap_err();
    assert!(matches!(err, QuantPivotError::Io(_)));
}
