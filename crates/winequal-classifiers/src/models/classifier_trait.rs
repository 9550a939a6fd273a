use ndarray::Array2;

use crate::config::BackendKind;
use crate::error::Result;

/// The contract shared by every backend: fit on a feature matrix and raw
/// labels, predict raw labels, and serialize to an opaque artifact payload.
///
/// Backends that need a different target space (the network wants dense
/// class indices) adapt inside their implementation; callers always deal in
/// the raw label strings.
pub trait ClassifierModel {
    fn kind(&self) -> BackendKind;

    /// Fit the model. Rows of `x` line up with `y`.
    fn fit(&mut self, x: &Array2<f64>, y: &[String]) -> Result<()>;

    /// Predict one label per row of `x`.
    fn predict(&self, x: &Array2<f64>) -> Result<Vec<String>>;

    /// Serialize the fitted model. Fails if the model has not been fitted.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        self.kind().display_name()
    }
}
