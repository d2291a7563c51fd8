//! Python bindings via PyO3.
//!
//! Datasets cross the boundary as `{language: {phone: [allophones]}}` and
//! scores come back as sorted `(phone1, phone2, score)` triples.

use std::collections::HashMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::config::EngineConfig;
use crate::engine::AllophoneEngine;
use crate::error::EngineError;
use crate::normalize;
use crate::similarity;
use crate::types::{Cooccurrence, InventoryDataset, ScoreData};

type PyDataset = HashMap<String, HashMap<String, Vec<String>>>;
type PyScores = Vec<(String, String, f64)>;

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn to_dataset(dataset: PyDataset) -> InventoryDataset {
    dataset
        .into_iter()
        .map(|(language, inventory)| {
            let inventory = inventory
                .into_iter()
                .map(|(phone, allophones)| (phone, allophones.into_iter().collect()))
                .collect();
            (language, inventory)
        })
        .collect()
}

fn to_triples(scores: ScoreData) -> PyScores {
    scores
        .into_iter()
        .map(|(pair, score)| {
            let (a, b): (String, String) = pair.into();
            (a, b, score)
        })
        .collect()
}

fn from_triples(triples: PyScores) -> ScoreData {
    triples
        .into_iter()
        .map(|(a, b, score)| (Cooccurrence::new(a, b), score))
        .collect()
}

#[pyfunction]
#[pyo3(signature = (dataset, prune_pendants = true))]
fn py_compute_distances(dataset: PyDataset, prune_pendants: bool) -> PyResult<PyScores> {
    let engine = AllophoneEngine::new(EngineConfig {
        prune_pendants,
        ..EngineConfig::default()
    });
    Ok(to_triples(engine.compute(&to_dataset(dataset))?))
}

#[pyfunction]
#[pyo3(signature = (dataset, prune_pendants = true))]
fn py_compute_similarity(dataset: PyDataset, prune_pendants: bool) -> PyResult<PyScores> {
    let engine = AllophoneEngine::new(EngineConfig {
        prune_pendants,
        ..EngineConfig::similarity()
    });
    Ok(to_triples(engine.compute(&to_dataset(dataset))?))
}

#[pyfunction]
fn py_similarity_from_distances(distances: PyScores) -> PyResult<PyScores> {
    let similarity = similarity::similarity_from_distances(&from_triples(distances))?;
    Ok(to_triples(similarity))
}

#[pyfunction]
fn py_normalize_ipa(transcription: &str) -> PyResult<String> {
    Ok(normalize::normalize_ipa(transcription))
}

#[pymodule]
fn simphones_core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_compute_distances, m)?)?;
    m.add_function(wrap_pyfunction!(py_compute_similarity, m)?)?;
    m.add_function(wrap_pyfunction!(py_similarity_from_distances, m)?)?;
    m.add_function(wrap_pyfunction!(py_normalize_ipa, m)?)?;
    Ok(())
}
