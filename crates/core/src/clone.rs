use crate::value::Value;

/// Produces snapshots of record values that are independent of caller-owned
/// data.
///
/// The engine calls this whenever it captures a new state or hands out an
/// aggregated copy. Implementations may normalize values on the way in, for
/// example to drop transient fields.
pub trait CloneStrategy {
    fn clone_value(&self, value: &Value) -> Value;
}

/// Structural deep copy. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeepClone;

impl CloneStrategy for DeepClone {
    fn clone_value(&self, value: &Value) -> Value {
        value.clone()
    }
}

impl<F> CloneStrategy for F
where
    F: Fn(&Value) -> Value,
{
    fn clone_value(&self, value: &Value) -> Value {
        self(value)
    }
}
