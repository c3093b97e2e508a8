//! ONNX token-classification recognizer.
//!
//! Loads a HuggingFace NER model exported to ONNX (a BERT-family token
//! classifier such as `dslim/bert-base-NER`) and tags each token with the
//! arg-max label. Tagged tokens are folded into entities by
//! `token_labels::decode_entities`. Requires the `onnx` feature.

#[cfg(feature = "onnx")]
mod inner {
    use std::fs::File;
    use std::path::Path;
    use std::sync::Arc;

    use ndarray::ArrayView2;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use sha2::{Digest, Sha256};
    use tokenizers::Tokenizer;
    use tracing::info;

    use reviewgraph_core::{EntitySet, Error, Result};

    use crate::recognizer::EntityRecognizer;
    use crate::token_labels::{decode_entities, LabelConfig, TaggedToken};

    /// Maximum sequence length for the model.
    const MAX_SEQ_LEN: usize = 512;

    fn unavailable(what: &str, e: impl std::fmt::Display) -> Error {
        Error::ModelUnavailable(format!("{}: {}", what, e))
    }

    fn extraction(what: &str, e: impl std::fmt::Display) -> Error {
        Error::Extraction(format!("{}: {}", what, e))
    }

    /// Content hash over the model, tokenizer and label files.
    fn hash_files(paths: &[&Path]) -> Result<String> {
        let mut hasher = Sha256::new();
        for path in paths {
            let mut file = File::open(path)?;
            std::io::copy(&mut file, &mut hasher)?;
        }
        Ok(hex::encode(hasher.finalize())[..16].to_string())
    }

    /// Statistical NER backend over an ONNX token classifier.
    pub struct OnnxRecognizer {
        name: String,
        fingerprint: String,
        session: Arc<Mutex<Session>>,
        tokenizer: Tokenizer,
        labels: Vec<String>,
        token_types: bool,
    }

    impl OnnxRecognizer {
        /// Load a model directory.
        ///
        /// Expects:
        /// - `model_dir/model.onnx`: the exported token classifier
        /// - `model_dir/tokenizer.json`: the HuggingFace tokenizer
        /// - `model_dir/config.json`: the model config with `id2label`
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");
            let config_path = model_dir.join("config.json");

            for path in [&model_path, &tokenizer_path, &config_path] {
                if !path.exists() {
                    return Err(Error::ModelUnavailable(format!(
                        "not found: {}",
                        path.display()
                    )));
                }
            }

            let config = LabelConfig::load(&config_path)?;

            // With load-dynamic, ORT_DYLIB_PATH must point to libonnxruntime
            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| unavailable("session builder", e))?
                .with_intra_threads(2)
                .map_err(|e| unavailable("session threads", e))?
                .commit_from_file(&model_path)
                .map_err(|e| unavailable("ONNX model", e))?;

            let tokenizer =
                Tokenizer::from_file(&tokenizer_path).map_err(|e| unavailable("tokenizer", e))?;

            let fingerprint = hash_files(&[&model_path, &tokenizer_path, &config_path])?;
            let name = format!(
                "onnx-{}",
                model_dir
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "model".to_string())
            );
            let labels = config.labels();

            info!(
                "ONNX recognizer loaded: {} labels, model={}",
                labels.len(),
                model_path.display()
            );

            Ok(Self {
                name,
                fingerprint,
                session: Arc::new(Mutex::new(session)),
                tokenizer,
                labels,
                token_types: config.uses_token_types(),
            })
        }

        /// Arg-max label id per token.
        fn classify(&self, ids: &[u32], mask: &[u32]) -> Result<Vec<usize>> {
            let seq_len = ids.len();
            let ids_data: Vec<i64> = ids.iter().map(|&id| id as i64).collect();
            let mask_data: Vec<i64> = mask.iter().map(|&m| m as i64).collect();

            let ids_tensor = Tensor::from_array(([1usize, seq_len], ids_data))
                .map_err(|e| extraction("ids tensor", e))?;
            let mask_tensor = Tensor::from_array(([1usize, seq_len], mask_data))
                .map_err(|e| extraction("mask tensor", e))?;

            let mut session = self.session.lock();
            let outputs = if self.token_types {
                let type_ids_tensor = Tensor::from_array(([1usize, seq_len], vec![0i64; seq_len]))
                    .map_err(|e| extraction("type_ids tensor", e))?;
                session.run(ort::inputs![ids_tensor, mask_tensor, type_ids_tensor])
            } else {
                session.run(ort::inputs![ids_tensor, mask_tensor])
            }
            .map_err(|e| extraction("ONNX inference", e))?;

            // Logits are [1, seq_len, num_labels]
            let (shape, data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| extraction("output tensor", e))?;
            let dims: Vec<i64> = shape.iter().copied().collect();
            if dims.len() != 3 || dims[1] as usize != seq_len {
                return Err(Error::Extraction(format!("unexpected logits shape {:?}", dims)));
            }
            let num_labels = dims[2] as usize;
            let logits = ArrayView2::from_shape((seq_len, num_labels), data)
                .map_err(|e| extraction("logits layout", e))?;

            Ok(logits
                .rows()
                .into_iter()
                .map(|row| {
                    row.iter()
                        .enumerate()
                        .fold((0, f32::NEG_INFINITY), |best, (i, &v)| {
                            if v > best.1 {
                                (i, v)
                            } else {
                                best
                            }
                        })
                        .0
                })
                .collect())
        }
    }

    impl EntityRecognizer for OnnxRecognizer {
        fn recognize(&self, text: &str) -> Result<EntitySet> {
            let encoding = self
                .tokenizer
                .encode(text, true)
                .map_err(|e| extraction("tokenization", e))?;

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            if seq_len == 0 {
                return Ok(EntitySet::default());
            }
            let ids = &encoding.get_ids()[..seq_len];
            let mask = &encoding.get_attention_mask()[..seq_len];
            let offsets = &encoding.get_offsets()[..seq_len];
            let special = &encoding.get_special_tokens_mask()[..seq_len];

            let classes = self.classify(ids, mask)?;
            let tokens: Vec<TaggedToken<'_>> = classes
                .iter()
                .zip(offsets)
                .zip(special)
                .filter(|&(_, &is_special)| is_special == 0)
                .map(|((&class, &(start, end)), _)| TaggedToken {
                    label: self.labels.get(class).map(String::as_str).unwrap_or("O"),
                    start,
                    end,
                })
                .collect();

            Ok(decode_entities(text, &tokens))
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn fingerprint(&self) -> String {
            format!("{}@{}", self.name, self.fingerprint)
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxRecognizer;
