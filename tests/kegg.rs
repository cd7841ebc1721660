use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;

use assert_matches::assert_matches;

use keggpull::domain::{OrganismCode, PathwayCode};
use keggpull::error::KeggError;
use keggpull::kegg::{
    Endpoints, KeggClient, KeggHttpClient, QueryStatus, classify_status, parse_pathway_list,
    pathway_kgml_url, pathway_list_url, pathway_text_url, rest_response_validator,
};

/// Serves a single HTTP response and returns the request line it received.
fn serve_once(status: u16, body: &str) -> (String, thread::JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let response = format!(
        "HTTP/1.1 {status} KEGG\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut request: Vec<u8> = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|window| window == b"\r\n\r\n") {
            let read = stream.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buf[..read]);
        }
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        String::from_utf8_lossy(&request)
            .lines()
            .next()
            .unwrap_or_default()
            .to_string()
    });
    (format!("http://{addr}"), handle)
}

fn client_for(base: &str) -> KeggHttpClient {
    KeggHttpClient::new(Endpoints::new(base), Duration::from_secs(5)).unwrap()
}

fn hsa() -> OrganismCode {
    "hsa".parse().unwrap()
}

fn glycolysis() -> PathwayCode {
    "hsa00010".parse().unwrap()
}

#[test]
fn url_builders() {
    assert_eq!(
        pathway_list_url("hsa"),
        "https://rest.kegg.jp/list/pathway/hsa"
    );
    assert_eq!(
        pathway_kgml_url("hsa00010"),
        "https://rest.kegg.jp/get/hsa00010/kgml"
    );
    assert_eq!(
        pathway_text_url("hsa00010"),
        "https://rest.kegg.jp/get/hsa00010"
    );
}

#[test]
fn custom_base_url() {
    let endpoints = Endpoints::new("http://127.0.0.1:9000");
    assert_eq!(endpoints.base_url(), "http://127.0.0.1:9000");
    assert_eq!(
        endpoints.pathway_kgml_url("eco00010"),
        "http://127.0.0.1:9000/get/eco00010/kgml"
    );
}

#[test]
fn parse_organism_pathways() {
    let input = "path:hsa00010\tGlycolysis / Gluconeogenesis - Homo sapiens (human)
path:hsa00020\tCitrate cycle (TCA cycle) - Homo sapiens (human)
path:hsa00030\tPentose phosphate pathway - Homo sapiens (human)
path:hsa00040\tPentose and glucuronate interconversions - Homo sapiens (human)
path:hsa00051\tFructose and mannose metabolism - Homo sapiens (human)
path:hsa00230\tPurine metabolism - Homo sapiens (human)";

    let codes = parse_pathway_list(input).unwrap();
    let codes: Vec<&str> = codes.iter().map(|code| code.as_str()).collect();
    assert_eq!(
        codes,
        vec![
            "hsa00010", "hsa00020", "hsa00030", "hsa00040", "hsa00051", "hsa00230"
        ]
    );
}

#[test]
fn parse_skips_blank_lines() {
    let codes = parse_pathway_list("\npath:hsa00010\tGlycolysis\n\n   \npath:hsa00020\tTCA\n").unwrap();
    assert_eq!(codes.len(), 2);
    assert_eq!(codes[0].as_str(), "hsa00010");
}

#[test]
fn parse_empty_listing() {
    assert!(parse_pathway_list("").unwrap().is_empty());
}

#[test]
fn parse_rejects_garbage_code() {
    let err = parse_pathway_list("path:hsa 00010\tbroken\n").unwrap_err();
    assert_matches!(err, KeggError::InvalidPathwayCode(_));
}

#[test]
fn response_validator() {
    assert!(rest_response_validator(200, "https://rest.kegg.jp/list/pathway/hsa"));
    assert!(!rest_response_validator(400, "https://rest.kegg.jp/list/pathway/hsa"));
    assert!(!rest_response_validator(404, "https://rest.kegg.jp/list/pathway/xyz"));
    for status in [500, 300, 100] {
        assert!(!rest_response_validator(status, "https://rest.kegg.jp/"));
    }
}

#[test]
fn status_classification_separates_invalid_from_unexpected() {
    assert_eq!(classify_status(200), QueryStatus::Valid);
    assert_eq!(classify_status(400), QueryStatus::Invalid);
    assert_eq!(classify_status(404), QueryStatus::Invalid);
    assert_eq!(classify_status(500), QueryStatus::Unexpected(500));
    assert_eq!(classify_status(300), QueryStatus::Unexpected(300));
    assert_eq!(classify_status(100), QueryStatus::Unexpected(100));
}

#[test]
fn http_list_returns_body() {
    let (base, server) = serve_once(200, "path:hsa00010\tGlycolysis\n");
    let client = client_for(&base);

    let body = client.fetch_pathway_list(&hsa()).unwrap();
    assert_eq!(body, "path:hsa00010\tGlycolysis\n");
    assert_eq!(server.join().unwrap(), "GET /list/pathway/hsa HTTP/1.1");
}

#[test]
fn http_kgml_returns_body() {
    let (base, server) = serve_once(200, "<pathway name=\"path:hsa00010\"/>");
    let client = client_for(&base);

    let body = client.fetch_pathway_kgml(&glycolysis()).unwrap();
    assert_eq!(body, "<pathway name=\"path:hsa00010\"/>");
    assert_eq!(server.join().unwrap(), "GET /get/hsa00010/kgml HTTP/1.1");
}

#[test]
fn http_list_error_status_is_list_fetch_failed() {
    let (base, server) = serve_once(500, "internal error");
    let client = client_for(&base);

    let err = client.fetch_pathway_list(&hsa()).unwrap_err();
    assert_matches!(
        err,
        KeggError::ListFetchFailed { ref organism, status: 500 } if organism == "hsa"
    );
    server.join().unwrap();
}

#[test]
fn http_kgml_not_found_is_markup_fetch_failed() {
    let (base, server) = serve_once(404, "");
    let client = client_for(&base);

    let err = client.fetch_pathway_kgml(&glycolysis()).unwrap_err();
    assert_matches!(
        err,
        KeggError::MarkupFetchFailed { ref pathway, status: 404 } if pathway == "hsa00010"
    );
    server.join().unwrap();
}

#[test]
fn http_check_query_follows_validator() {
    for (status, expected) in [(200, true), (404, false), (500, false)] {
        let (base, server) = serve_once(status, "");
        let client = client_for(&base);
        let url = client.endpoints().pathway_kgml_url("hsa00010");

        assert_eq!(client.check_query(&url).unwrap(), expected, "status {status}");
        server.join().unwrap();
    }
}

#[test]
fn unreachable_server_is_transport_error() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(&format!("http://{addr}"));

    let err = client.fetch_pathway_list(&hsa()).unwrap_err();
    assert_matches!(err, KeggError::KeggHttp(_));
}
