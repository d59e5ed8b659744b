//! Golden wire tests for the analysis service contract.
//!
//! The JSON files under tests/golden/ are captured service payloads. If a
//! field is renamed on our side these tests fail before the service does.

use tesisview_protocol::{
    ErrorBody, QueryRequest, QueryResponse, UploadResponse,
};

fn golden(name: &str) -> serde_json::Value {
    let path = format!("tests/golden/{}", name);
    serde_json::from_str(
        &std::fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Cannot read {}: {}", path, e))
    ).unwrap_or_else(|e| panic!("Cannot parse {}: {}", path, e))
}

/// Every key in the golden object must survive a parse → serialize cycle.
fn assert_same_keys(golden: &serde_json::Value, serialized: &serde_json::Value, file: &str) {
    let golden_obj = golden.as_object().expect("golden file should be an object");
    let serial_obj = serialized.as_object().expect("type should serialize as object");
    for key in golden_obj.keys() {
        assert!(
            serial_obj.contains_key(key),
            "Golden key '{}' missing from serialization (file: {})",
            key, file,
        );
    }
    assert_eq!(golden_obj.len(), serial_obj.len(), "extra keys emitted (file: {})", file);
}

#[test]
fn test_golden_upload_response() {
    let json = golden("upload-response.json");
    let parsed: UploadResponse = serde_json::from_value(json.clone()).unwrap();

    assert_eq!(parsed.pdf_name.as_str(), "tesis.pdf");
    assert_eq!(parsed.results.len(), 4);
    assert_eq!(parsed.results.keys().next(), Some("Título de la tesis"));
    assert_eq!(parsed.observations.len(), 2);

    let back = serde_json::to_value(&parsed).unwrap();
    assert_same_keys(&json, &back, "upload-response.json");
    assert_eq!(back["results"], json["results"]);
}

#[test]
fn test_golden_query_request() {
    let request = QueryRequest {
        pdf_name: "tesis.pdf".into(),
        pregunta: "¿Quién es el asesor?".into(),
    };
    let json = golden("query-request.json");
    assert_eq!(serde_json::to_value(&request).unwrap(), json);
}

#[test]
fn test_golden_query_response() {
    let json = golden("query-response.json");
    let parsed: QueryResponse = serde_json::from_value(json.clone()).unwrap();
    assert_eq!(parsed.respuesta, "El asesor de la tesis es: Dr. Luis Soto");
    assert_same_keys(&json, &serde_json::to_value(&parsed).unwrap(), "query-response.json");
}

#[test]
fn test_golden_error_body() {
    let raw = std::fs::read_to_string("tests/golden/error.json").unwrap();
    assert_eq!(ErrorBody::message_from(&raw), "Invalid file format");
}
