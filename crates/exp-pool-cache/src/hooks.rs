use std::sync::Arc;

use exp_pool_core::ExpPoolError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Turns the `req` keyword into the string used as lookup key material.
pub type ReqSerializeFn = dyn Fn(&Value) -> Result<String, ExpPoolError> + Send + Sync;
/// Turns a raw response into the string persisted with the experience.
pub type RespSerializeFn<T> = dyn Fn(&T) -> Result<String, ExpPoolError> + Send + Sync;
/// Turns a persisted response back into the wrapped function's return type.
pub type RespDeserializeFn<T> = dyn Fn(&str) -> Result<T, ExpPoolError> + Send + Sync;

/// Request/response (de)serialization used by one cached function.
pub struct SerdeHooks<T> {
    pub req_serialize: Arc<ReqSerializeFn>,
    pub resp_serialize: Arc<RespSerializeFn<T>>,
    pub resp_deserialize: Arc<RespDeserializeFn<T>>,
}

impl<T> SerdeHooks<T> {
    pub fn new(
        req_serialize: Arc<ReqSerializeFn>,
        resp_serialize: Arc<RespSerializeFn<T>>,
        resp_deserialize: Arc<RespDeserializeFn<T>>,
    ) -> Self {
        Self {
            req_serialize,
            resp_serialize,
            resp_deserialize,
        }
    }
}

impl<T> Clone for SerdeHooks<T> {
    fn clone(&self) -> Self {
        Self {
            req_serialize: self.req_serialize.clone(),
            resp_serialize: self.resp_serialize.clone(),
            resp_deserialize: self.resp_deserialize.clone(),
        }
    }
}

impl<T> SerdeHooks<T>
where
    T: Serialize + DeserializeOwned + 'static,
{
    /// JSON hooks: responses are stored as JSON text and parsed back strictly,
    /// so a hit yields exactly the value the function returned.
    pub fn json() -> Self {
        Self {
            req_serialize: Arc::new(default_req_serialize),
            resp_serialize: Arc::new(default_resp_serialize::<T>),
            resp_deserialize: Arc::new(default_resp_deserialize::<T>),
        }
    }
}

impl SerdeHooks<String> {
    /// Plain-text hooks for `String` responses: stored and returned verbatim.
    pub fn text() -> Self {
        Self {
            req_serialize: Arc::new(default_req_serialize),
            resp_serialize: Arc::new(|resp: &String| Ok::<_, ExpPoolError>(resp.clone())),
            resp_deserialize: Arc::new(|stored: &str| Ok::<_, ExpPoolError>(stored.to_string())),
        }
    }
}

impl<T> std::fmt::Debug for SerdeHooks<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerdeHooks").finish_non_exhaustive()
    }
}

/// String requests are used as-is; other values are rendered as JSON.
pub fn default_req_serialize(req: &Value) -> Result<String, ExpPoolError> {
    Ok(match req {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

pub fn default_resp_serialize<T: Serialize>(resp: &T) -> Result<String, ExpPoolError> {
    serde_json::to_string(resp)
        .map_err(|e| ExpPoolError::Serialization(format!("cannot serialize response: {e}")))
}

/// Inverse of [`default_resp_serialize`].
pub fn default_resp_deserialize<T: DeserializeOwned>(resp: &str) -> Result<T, ExpPoolError> {
    serde_json::from_str(resp).map_err(|e| {
        ExpPoolError::Serialization(format!("cannot deserialize stored response: {e}"))
    })
}
