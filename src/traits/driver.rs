use crate::attributes::Attribute;
use crate::errors::{Error, Result};
use crate::value::{CallArgs, Value};

/// Outcome of a write confirmation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Confirmation {
    pub ok: bool,
    pub detail: Option<String>,
}

impl Confirmation {
    pub fn confirmed() -> Self {
        Self {
            ok: true,
            detail: None,
        }
    }

    pub fn refused(detail: impl Into<String>) -> Self {
        Self {
            ok: false,
            detail: Some(detail.into()),
        }
    }
}

/// Transport collaborator of a root host.
///
/// Sub-containers never own a driver: they forward every call to their
/// parent, channels adding their id as the `ch_id` named argument.
pub trait Driver: Send + Sync {
    /// Query the device using the attribute read token.
    fn default_get(&self, attribute: &Attribute, token: &Value, args: &CallArgs) -> Result<Value>;

    /// Send a value to the device using the attribute write token.
    fn default_set(
        &self,
        attribute: &Attribute,
        token: &Value,
        value: &Value,
        args: &CallArgs,
    ) -> Result<Value>;

    /// Whether a write took effect. Confirms by default.
    fn confirm_operation(
        &self,
        _attribute: &Attribute,
        _value: &Value,
        _transformed: &Value,
        _response: &Value,
    ) -> Result<Confirmation> {
        Ok(Confirmation::confirmed())
    }

    /// Re-open the connection after a retryable failure.
    fn reconnect(&self) -> Result<()>;

    /// Whether a failed read or write stage should be attempted again.
    fn is_retryable(&self, error: &Error) -> bool {
        error.is_communication()
    }
}
