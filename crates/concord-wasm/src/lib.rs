//! WebAssembly bindings for `concord`.
//!
//! Rankings cross the boundary as arrays of string arrays. Results come back
//! as plain objects.

use wasm_bindgen::prelude::*;

use concord::{AggregationConfig, DistanceMetric};

/// Build a config from optional JS arguments.
fn config_from(
    max_iters: Option<usize>,
    metric: Option<String>,
) -> Result<AggregationConfig, String> {
    let mut config = AggregationConfig::default();
    if let Some(max_iters) = max_iters {
        config = config.with_max_iters(max_iters);
    }
    if let Some(metric) = metric {
        let metric = metric
            .parse::<DistanceMetric>()
            .map_err(|e| e.to_string())?;
        config = config.with_metric(metric);
    }
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Helper to convert a JS array of string arrays to rankings.
fn js_to_rankings(js: &JsValue) -> Result<Vec<Vec<String>>, JsValue> {
    use wasm_bindgen::JsCast;

    let array = js
        .dyn_ref::<js_sys::Array>()
        .ok_or_else(|| JsValue::from_str("Expected array of rankings"))?;

    let mut rankings = Vec::with_capacity(array.length() as usize);
    for (idx, item) in array.iter().enumerate() {
        let list = item.dyn_ref::<js_sys::Array>().ok_or_else(|| {
            JsValue::from_str(&format!("Expected ranking (array) at index {}", idx))
        })?;
        let mut ranking = Vec::with_capacity(list.length() as usize);
        for (pos, id) in list.iter().enumerate() {
            let id = id.as_string().ok_or_else(|| {
                JsValue::from_str(&format!(
                    "document id must be a string at ranking {}, position {}",
                    idx, pos
                ))
            })?;
            ranking.push(id);
        }
        rankings.push(ranking);
    }
    Ok(rankings)
}

fn strings_to_js(ids: &[String]) -> js_sys::Array {
    ids.iter().map(|id| JsValue::from_str(id)).collect()
}

fn weights_to_js(weights: &[f64]) -> js_sys::Array {
    weights.iter().map(|&w| JsValue::from_f64(w)).collect()
}

fn set(target: &js_sys::Object, key: &str, value: &JsValue) -> Result<(), JsValue> {
    js_sys::Reflect::set(target, &JsValue::from_str(key), value).map(|_| ())
}

/// Query-level aggregation.
///
/// Returns `{ ranking, confidence, converged, iterations }`.
#[wasm_bindgen(js_name = aggregateQuery)]
pub fn aggregate_query(
    rankings: &JsValue,
    max_iters: Option<usize>,
    metric: Option<String>,
) -> Result<JsValue, JsValue> {
    let rankings = js_to_rankings(rankings)?;
    let config = config_from(max_iters, metric).map_err(|e| JsValue::from_str(&e))?;
    let result = concord::aggregate_query(&rankings, &config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let out = js_sys::Object::new();
    set(&out, "ranking", &strings_to_js(&result.ranking))?;
    set(&out, "confidence", &weights_to_js(result.confidence.as_slice()))?;
    set(&out, "converged", &JsValue::from_bool(result.converged))?;
    set(&out, "iterations", &JsValue::from_f64(result.iterations as f64))?;
    Ok(out.into())
}

/// Corpus-level aggregation over an array of queries.
///
/// Returns `{ confidence, rankings, iterations }`.
#[wasm_bindgen(js_name = aggregateCorpus)]
pub fn aggregate_corpus(
    queries: &JsValue,
    max_iters: Option<usize>,
    metric: Option<String>,
) -> Result<JsValue, JsValue> {
    use wasm_bindgen::JsCast;

    let array = queries
        .dyn_ref::<js_sys::Array>()
        .ok_or_else(|| JsValue::from_str("Expected array of queries"))?;
    let corpus = array
        .iter()
        .map(|query| js_to_rankings(&query))
        .collect::<Result<Vec<_>, _>>()?;

    let config = config_from(max_iters, metric).map_err(|e| JsValue::from_str(&e))?;
    let result = concord::aggregate_corpus(&corpus, &config)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    let rankings: js_sys::Array = result
        .rankings
        .iter()
        .map(|ranking| JsValue::from(strings_to_js(ranking)))
        .collect();

    let out = js_sys::Object::new();
    set(&out, "confidence", &weights_to_js(result.confidence.as_slice()))?;
    set(&out, "rankings", &rankings)?;
    set(&out, "iterations", &JsValue::from_f64(result.iterations as f64))?;
    Ok(out.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_and_overrides() {
        assert_eq!(config_from(None, None).unwrap(), AggregationConfig::default());

        let config = config_from(Some(3), Some("dKT".to_string())).unwrap();
        assert_eq!(config.max_iters, 3);
        assert_eq!(config.metric, DistanceMetric::DiscountedKendallTau);
    }

    #[test]
    fn config_rejects_bad_arguments() {
        assert!(config_from(Some(0), None).is_err());
        assert!(config_from(None, Some("spearman".to_string()))
            .unwrap_err()
            .contains("spearman"));
    }
}
