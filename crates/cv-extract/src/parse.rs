use serde_json::{Map, Value};

use cv_core::FeatureVector;

use crate::error::ExtractionError;

/// Parse a model reply into a feature vector.
///
/// The first `{` that starts a complete JSON object wins; prose or code
/// fences around it are ignored, including text after the object. All eight
/// columns must be present as numbers in `[0, 1]`; anything else is rejected
/// so the caller can fall back instead of guessing.
pub fn parse_feature_reply(reply: &str) -> Result<FeatureVector, ExtractionError> {
    let mut last_err = None;
    for (start, _) in reply.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&reply[start..]).into_iter::<Map<String, Value>>();
        match stream.next() {
            Some(Ok(obj)) => {
                return FeatureVector::from_json_object(&obj).map_err(|e| ExtractionError::Schema(e.to_string()))
            }
            Some(Err(e)) => last_err = Some(e),
            None => {}
        }
    }
    Err(match last_err {
        Some(e) => ExtractionError::Decode(format!("invalid JSON in reply: {e}")),
        None => ExtractionError::Decode("no JSON object in reply".into()),
    })
}
