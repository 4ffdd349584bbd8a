//! Pre-trained stump bank in its JSON interchange format.
//!
//! The file is an array of records shaped like
//! `{"feature": {"Type", "Width", "Height", "PosX", "PosY"}, "threshold",
//! "error", "polarity", "amountOfSay"}` in training order.

use anyhow::{anyhow, Context, Result};
use haar_core::{Cascade, FeatureShape, HaarFeature, Polarity, Stump};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FeatureRecord {
    #[serde(rename = "Type")]
    pub kind: u8,
    #[serde(rename = "Width")]
    pub width: u32,
    #[serde(rename = "Height")]
    pub height: u32,
    #[serde(rename = "PosX")]
    pub pos_x: u32,
    #[serde(rename = "PosY")]
    pub pos_y: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StumpRecord {
    pub feature: FeatureRecord,
    pub threshold: f64,
    #[serde(default)]
    pub error: f64,
    pub polarity: f64,
    pub amount_of_say: f64,
}

impl TryFrom<&StumpRecord> for Stump {
    type Error = String;

    fn try_from(r: &StumpRecord) -> Result<Self, Self::Error> {
        let f = &r.feature;
        Ok(Stump {
            feature: HaarFeature::new(
                FeatureShape::try_from(f.kind)?,
                f.width,
                f.height,
                f.pos_x,
                f.pos_y,
            ),
            threshold: r.threshold,
            polarity: Polarity::try_from(r.polarity)?,
            weight: r.amount_of_say,
            error: r.error,
        })
    }
}

impl From<&Stump> for StumpRecord {
    fn from(s: &Stump) -> Self {
        StumpRecord {
            feature: FeatureRecord {
                kind: s.feature.shape.code(),
                width: s.feature.width,
                height: s.feature.height,
                pos_x: s.feature.offset_x,
                pos_y: s.feature.offset_y,
            },
            threshold: s.threshold,
            error: s.error,
            polarity: s.polarity.sign(),
            amount_of_say: s.weight,
        }
    }
}

/// Convert decoded records into a cascade, preserving their order.
pub fn cascade_from_records(records: &[StumpRecord]) -> Result<Cascade> {
    records
        .iter()
        .enumerate()
        .map(|(i, r)| Stump::try_from(r).map_err(|e| anyhow!("stump #{i}: {e}")))
        .collect()
}

/// Parse a stump bank from a JSON string.
pub fn parse_cascade(json: &str) -> Result<Cascade> {
    let records: Vec<StumpRecord> = serde_json::from_str(json).context("parsing stump records")?;
    cascade_from_records(&records)
}

/// Load a stump bank from a JSON file.
pub fn load_cascade(path: &Path) -> Result<Cascade> {
    let file = File::open(path).with_context(|| format!("opening stumps {}", path.display()))?;
    let records: Vec<StumpRecord> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("parsing stumps {}", path.display()))?;
    cascade_from_records(&records).with_context(|| format!("decoding stumps {}", path.display()))
}

/// Serialize a cascade back to its JSON interchange format.
pub fn cascade_to_json(cascade: &Cascade) -> Result<String> {
    let records: Vec<StumpRecord> = cascade.stumps().iter().map(StumpRecord::from).collect();
    Ok(serde_json::to_string_pretty(&records)?)
}
