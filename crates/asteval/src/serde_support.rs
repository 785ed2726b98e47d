//! `serde::Serialize` for `PyValue`, gated behind the `serde` feature.
//!
//! Only one direction is provided. Deserializing arbitrary JSON back into a
//! `PyValue` would need to invent a mapping for every JSON shape with no
//! script-side counterpart to validate it against, so hosts that need
//! structured input should build `PyValue`s directly via `From`/`FromPyValue`
//! and hand them to `Interpreter::set_symbol`.

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::value::PyValue;

impl Serialize for PyValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            PyValue::None => serializer.serialize_none(),
            PyValue::Bool(b) => serializer.serialize_bool(*b),
            PyValue::Int(i) => serializer.serialize_i64(*i),
            PyValue::Float(f) => serializer.serialize_f64(*f),
            PyValue::Str(s) => serializer.serialize_str(s),
            PyValue::Bytes(b) => serializer.serialize_bytes(b),
            PyValue::Ellipsis => serializer.serialize_str("..."),
            PyValue::List(items) | PyValue::Tuple(items) | PyValue::Set(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            PyValue::Dict(pairs) => {
                let mut map = serializer.serialize_map(Some(pairs.len()))?;
                for (k, v) in pairs {
                    map.serialize_entry(&k.py_str(), v)?;
                }
                map.end()
            }
            // Callables and opaque host objects have no data representation;
            // serialize their repr so they are at least visible in a trace.
            PyValue::Function(_) | PyValue::Native(_) | PyValue::Host(_) => {
                serializer.serialize_str(&self.py_repr())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_serializes_as_json_array() {
        let v = PyValue::List(vec![PyValue::Int(1), PyValue::Int(2)]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "[1,2]");
    }

    #[test]
    fn dict_serializes_as_json_object_with_string_keys() {
        let v = PyValue::Dict(vec![(PyValue::Str("a".to_string()), PyValue::Int(1))]);
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "{\"a\":1}");
    }

    #[test]
    fn config_round_trips_through_json() {
        let cfg = crate::config::Config::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: crate::config::Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.max_cycles, cfg.max_cycles);
    }
}
