//! Inline dataset injection.
//!
//! Hosts keep the raw extracted text and the rendered spec side by side, so
//! injection must build a fresh object rather than patching the extracted
//! one in place.

use serde_json::{json, Value};

/// Return a copy of `spec` whose `data` field references `values` inline.
///
/// Any existing `data` field is replaced. Non-object inputs are returned
/// unchanged — extraction already guarantees the spec is an object.
pub fn inline_data(spec: &Value, values: Value) -> Value {
    let Some(obj) = spec.as_object() else {
        return spec.clone();
    };

    let mut out = obj.clone();
    out.insert("data".to_string(), json!({ "values": values }));
    Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attaches_values_under_data() {
        let spec = json!({"mark": "bar", "encoding": {}});
        let values = json!([{"region": "north", "revenue": 120}]);

        let injected = inline_data(&spec, values.clone());
        assert_eq!(injected["data"]["values"], values);
        assert_eq!(injected["mark"], "bar");
    }

    #[test]
    fn input_spec_is_left_untouched() {
        let spec = json!({"mark": "bar", "encoding": {}});
        let before = spec.clone();

        let _ = inline_data(&spec, json!([1, 2]));
        assert_eq!(spec, before);
    }

    #[test]
    fn existing_data_source_is_replaced() {
        let spec = json!({"mark": "bar", "encoding": {}, "data": {"url": "remote.csv"}});

        let injected = inline_data(&spec, json!([{"x": 1}]));
        assert_eq!(injected["data"], json!({"values": [{"x": 1}]}));
    }

    #[test]
    fn non_object_spec_passes_through() {
        let spec = json!(["not", "an", "object"]);
        assert_eq!(inline_data(&spec, json!([])), spec);
    }
}
