//! ReviewGraph Infer: named-entity recognition.
//!
//! Provides the `EntityRecognizer` trait for tagging products, brands,
//! locations and persons in review text. `GazetteerRecognizer` matches a
//! term model loaded from disk (or the built-in one). With the `onnx`
//! feature, a model directory loads `OnnxRecognizer`, a statistical token
//! classifier. When a configured model cannot be loaded, `NoopRecognizer`
//! is used and entity fields stay empty.

pub mod gazetteer;
pub mod onnx_recognizer;
pub mod recognizer;
pub mod token_labels;

pub use gazetteer::{GazetteerModel, GazetteerRecognizer};
pub use recognizer::{EntityRecognizer, NoopRecognizer};

#[cfg(feature = "onnx")]
pub use onnx_recognizer::OnnxRecognizer;

use std::path::Path;
use std::sync::Arc;

/// Create the best available recognizer.
///
/// No path selects the built-in gazetteer. A directory is an ONNX model
/// (`onnx` feature), a file is a gazetteer model. A path that fails to load
/// degrades to `NoopRecognizer` with a warning rather than failing.
pub fn create_recognizer(model: Option<&Path>) -> Arc<dyn EntityRecognizer> {
    let Some(path) = model else {
        tracing::info!("Using built-in gazetteer recognizer");
        return Arc::new(GazetteerRecognizer::builtin());
    };

    if path.is_dir() {
        return create_onnx_recognizer(path);
    }

    match GazetteerModel::load(path).and_then(GazetteerRecognizer::new) {
        Ok(recognizer) => {
            tracing::info!(
                "Using gazetteer recognizer '{}' from {}",
                recognizer.name(),
                path.display()
            );
            Arc::new(recognizer)
        }
        Err(e) => {
            tracing::warn!("NER model unavailable: {}. Entity fields will be empty.", e);
            Arc::new(NoopRecognizer)
        }
    }
}

fn create_onnx_recognizer(model_dir: &Path) -> Arc<dyn EntityRecognizer> {
    #[cfg(feature = "onnx")]
    {
        match OnnxRecognizer::load(model_dir) {
            Ok(recognizer) => {
                tracing::info!("Using ONNX recognizer '{}'", recognizer.name());
                return Arc::new(recognizer);
            }
            Err(e) => {
                tracing::warn!("ONNX recognizer unavailable: {}. Entity fields will be empty.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::warn!(
            "{} is a model directory but the onnx feature is disabled. Entity fields will be empty.",
            model_dir.display()
        );
    }

    Arc::new(NoopRecognizer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_degrades_to_noop() {
        let recognizer = create_recognizer(Some(Path::new("/nonexistent/ner.json")));
        assert!(!recognizer.is_available());
        let entities = recognizer.recognize("Samsung phone from Mexico").unwrap();
        assert!(entities.is_empty());
    }

    #[test]
    fn test_incomplete_model_dir_degrades_to_noop() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.json"), r#"{"id2label": {"0": "O"}}"#).unwrap();
        let recognizer = create_recognizer(Some(dir.path()));
        assert!(!recognizer.is_available());
        assert_eq!(recognizer.fingerprint(), "noop");
    }

    #[test]
    fn test_default_is_builtin() {
        let recognizer = create_recognizer(None);
        assert!(recognizer.is_available());
        assert_eq!(recognizer.name(), "builtin-gazetteer");
    }
}
