//! Model persistence
//!
//! A fitted predictor is written as one JSON document:
//!
//! ```json
//! {"format": "steamrec-model", "version": 1, "variant": "user_knn", "state": { ... }}
//! ```
//!
//! `state` carries the configuration, the interaction matrix with both axes,
//! and the fitted parameters (effective K, or the W/H factors). Loading checks
//! the envelope before touching `state`, so a model saved by one variant can
//! never be read back as another. Restored state is validated: repeated axis
//! ids, non-finite values or negative factors fail with `CorruptState`. The
//! neighbor index is rebuilt from the matrix rows; nothing is refitted.
//!
//! # Example
//!
//! ```rust
//! use steamrec_core::{Persist, Predictor, RatingRecord, RatingTable, UserKnn, ItemKnn};
//!
//! let table = RatingTable::from_records(vec![RatingRecord::new("u1", "i1", 4.0)]);
//! let mut model = UserKnn::default();
//! model.fit(&table).unwrap();
//!
//! let bytes = model.to_bytes().unwrap();
//! let restored = UserKnn::from_bytes(&bytes).unwrap();
//! assert_eq!(restored.predict("u1", "i1"), model.predict("u1", "i1"));
//!
//! // Wrong variant fails loudly
//! assert!(ItemKnn::from_bytes(&bytes).is_err());
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tracing::debug;

use crate::error::{RecommendError, Result};
use crate::latent::{LatentFactorPredictor, LatentFactorState};
use crate::logging::target;
use crate::neighborhood::{ItemKnn, NeighborhoodPredictor, NeighborhoodState, Orientation, UserKnn};
use crate::predictor::{FitReport, Prediction, Predictor, Variant};
use crate::table::RatingTable;

/// Value of the `format` field
pub const FORMAT: &str = "steamrec-model";

/// Current envelope version
pub const VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a, S> {
    format: &'a str,
    version: u32,
    variant: &'a str,
    state: &'a S,
}

#[derive(Deserialize)]
struct Envelope {
    format: String,
    version: u32,
    variant: String,
    state: Box<RawValue>,
}

impl Envelope {
    fn read<R: Read>(reader: R) -> Result<Self> {
        let envelope: Envelope = serde_json::from_reader(reader)?;
        if envelope.format != FORMAT {
            return Err(RecommendError::UnsupportedFormat(format!(
                "expected format '{}', found '{}'",
                FORMAT, envelope.format
            )));
        }
        if envelope.version != VERSION {
            return Err(RecommendError::UnsupportedFormat(format!(
                "unsupported version {} (expected {})",
                envelope.version, VERSION
            )));
        }
        Ok(envelope)
    }

    fn expect_variant(&self, expected: Variant) -> Result<()> {
        if self.variant != expected.as_str() {
            return Err(RecommendError::StateMismatch {
                expected: expected.to_string(),
                found: self.variant.clone(),
            });
        }
        Ok(())
    }
}

/// A predictor whose fitted state can be saved and restored.
pub trait Persist: Predictor + Sized {
    /// Tag written into the envelope
    const VARIANT: Variant;

    /// Serializable fitted state
    type State: Serialize + DeserializeOwned;

    /// Fitted state, `None` before `fit`
    fn fitted_state(&self) -> Option<&Self::State>;

    /// Rebuild a predictor from restored state, checking its invariants
    fn from_fitted_state(state: Self::State) -> Result<Self>;

    /// Write the model to any writer
    fn save_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let state = self.fitted_state().ok_or(RecommendError::NotFitted)?;
        let envelope = EnvelopeRef {
            format: FORMAT,
            version: VERSION,
            variant: Self::VARIANT.as_str(),
            state,
        };
        serde_json::to_writer(writer, &envelope)?;
        Ok(())
    }

    /// Read a model written by [`Persist::save_to_writer`] of the same variant
    fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        let envelope = Envelope::read(reader)?;
        envelope.expect_variant(Self::VARIANT)?;
        let state: Self::State = serde_json::from_str(envelope.state.get())?;
        Self::from_fitted_state(state)
    }

    /// Write the model to a file, replacing it if present
    fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.save_to_writer(&mut writer)?;
        writer.flush()?;
        debug!(target: target::PERSIST, variant = %Self::VARIANT, path = %path.display(), "saved model");
        Ok(())
    }

    /// Read a model file
    fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let model = Self::load_from_reader(BufReader::new(File::open(path)?))?;
        debug!(target: target::PERSIST, variant = %Self::VARIANT, path = %path.display(), "loaded model");
        Ok(model)
    }

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        self.save_to_writer(&mut bytes)?;
        Ok(bytes)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load_from_reader(bytes)
    }
}

impl<O: Orientation> Persist for NeighborhoodPredictor<O> {
    const VARIANT: Variant = O::VARIANT;
    type State = NeighborhoodState;

    fn fitted_state(&self) -> Option<&Self::State> {
        self.state()
    }

    fn from_fitted_state(state: Self::State) -> Result<Self> {
        Self::from_state(state)
    }
}

impl Persist for LatentFactorPredictor {
    const VARIANT: Variant = Variant::LatentFactor;
    type State = LatentFactorState;

    fn fitted_state(&self) -> Option<&Self::State> {
        self.state()
    }

    fn from_fitted_state(state: Self::State) -> Result<Self> {
        Self::from_state(state)
    }
}

/// Any predictor variant, for callers that learn the variant from the file
#[derive(Debug, Clone)]
pub enum AnyPredictor {
    UserKnn(UserKnn),
    ItemKnn(ItemKnn),
    LatentFactor(LatentFactorPredictor),
}

impl AnyPredictor {
    /// Read a model of whichever variant the envelope names
    pub fn load_from_reader<R: Read>(reader: R) -> Result<Self> {
        let envelope = Envelope::read(reader)?;
        let state = envelope.state.get();
        match Variant::parse(&envelope.variant) {
            Some(Variant::UserKnn) => Ok(Self::UserKnn(UserKnn::from_fitted_state(
                serde_json::from_str(state)?,
            )?)),
            Some(Variant::ItemKnn) => Ok(Self::ItemKnn(ItemKnn::from_fitted_state(
                serde_json::from_str(state)?,
            )?)),
            Some(Variant::LatentFactor) => Ok(Self::LatentFactor(
                LatentFactorPredictor::from_fitted_state(serde_json::from_str(state)?)?,
            )),
            None => Err(RecommendError::UnsupportedFormat(format!(
                "unknown model variant '{}'",
                envelope.variant
            ))),
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_from_reader(BufReader::new(File::open(path)?))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::load_from_reader(bytes)
    }

    pub fn save_to_writer<W: Write>(&self, writer: W) -> Result<()> {
        match self {
            Self::UserKnn(model) => model.save_to_writer(writer),
            Self::ItemKnn(model) => model.save_to_writer(writer),
            Self::LatentFactor(model) => model.save_to_writer(writer),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        match self {
            Self::UserKnn(model) => model.save(path),
            Self::ItemKnn(model) => model.save(path),
            Self::LatentFactor(model) => model.save(path),
        }
    }

    fn inner(&self) -> &dyn Predictor {
        match self {
            Self::UserKnn(model) => model,
            Self::ItemKnn(model) => model,
            Self::LatentFactor(model) => model,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Predictor {
        match self {
            Self::UserKnn(model) => model,
            Self::ItemKnn(model) => model,
            Self::LatentFactor(model) => model,
        }
    }
}

impl From<UserKnn> for AnyPredictor {
    fn from(model: UserKnn) -> Self {
        Self::UserKnn(model)
    }
}

impl From<ItemKnn> for AnyPredictor {
    fn from(model: ItemKnn) -> Self {
        Self::ItemKnn(model)
    }
}

impl From<LatentFactorPredictor> for AnyPredictor {
    fn from(model: LatentFactorPredictor) -> Self {
        Self::LatentFactor(model)
    }
}

impl Predictor for AnyPredictor {
    fn variant(&self) -> Variant {
        self.inner().variant()
    }

    fn fit(&mut self, table: &RatingTable) -> Result<FitReport> {
        self.inner_mut().fit(table)
    }

    fn predict(&self, user_id: &str, item_id: &str) -> Prediction {
        self.inner().predict(user_id, item_id)
    }

    fn is_fitted(&self) -> bool {
        self.inner().is_fitted()
    }
}
