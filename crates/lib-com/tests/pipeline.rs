//! Parse, validate and orchestrate a small channel end to end.

use std::collections::BTreeMap;

use lib_com::{simulation_fingerprint, ComAnalysisOrchestrator, ComError, SimulationParameters};
use lib_touchstone::{parse_touchstone, SParameterValidator};

const CHANNEL_S2P: &str = "\
! Two-port channel, GHz / S / MA
# GHz S MA R 50
0.1  0.05 -10  0.98 -5   0.98 -5   0.05 -10
1.0  0.08 -40  0.90 -50  0.90 -50  0.08 -40
2.0  0.10 -80  0.80 -100 0.80 -100 0.10 -80
4.0  0.15 -160 0.60 -200 0.60 -200 0.15 -160
8.0  0.20 150  0.35 -400 0.35 -400 0.20 150
";

fn parameters(mapping: &[(&str, usize)]) -> SimulationParameters {
    let json = serde_json::json!({
        "frequency_range": [0.0, 10e9],
        "port_mapping": mapping.iter().map(|(n, p)| (n.to_string(), *p)).collect::<BTreeMap<_, _>>(),
        "settings": {
            "resolution": 1e6,
            "max_iterations": 50,
            "sample_rate": 16e9,
            "bit_rate": 2e9,
            "num_bits": 254,
            "drive_port": 0
        }
    });
    serde_json::from_value(json).unwrap()
}

#[test]
fn test_parse_validate_orchestrate() {
    let dataset = parse_touchstone(CHANNEL_S2P).unwrap();
    assert_eq!(dataset.num_ports(), 2);
    assert_eq!(dataset.len(), 5);
    assert!(SParameterValidator::new().validate(&dataset).is_empty());

    let params = parameters(&[("thru", 1), ("reflect", 0)]).into_validated().unwrap();
    let result = ComAnalysisOrchestrator::new(params).run(&dataset, "ch-1").unwrap();

    assert!(result.success);
    assert_eq!(result.simulation_type, "com");
    assert_eq!(result.port_results.len(), 2);

    let thru = result.port_results["thru"].result().unwrap();
    assert_eq!(thru.time_data.len(), 254 * 8);
    assert!(thru.eye_params.height > 0.0);
    assert!((0.0..=1.0).contains(&thru.eye_params.width));
    assert!((0.0..=100.0).contains(&thru.eye_params.crossing_percentage));

    // The lossy thru carries more energy than the small reflection.
    let reflect = result.port_results["reflect"].result().unwrap();
    assert!(thru.analysis.rms > reflect.analysis.rms);
}

#[test]
fn test_identical_runs_are_reproducible() {
    let dataset = parse_touchstone(CHANNEL_S2P).unwrap();
    let run = || {
        let params = parameters(&[("thru", 1)]).into_validated().unwrap();
        ComAnalysisOrchestrator::new(params).run(&dataset, "ch-1").unwrap()
    };
    assert_eq!(run(), run());

    let key = simulation_fingerprint(CHANNEL_S2P, &parameters(&[("thru", 1)])).unwrap();
    assert_eq!(key, simulation_fingerprint(CHANNEL_S2P, &parameters(&[("thru", 1)])).unwrap());
}

#[test]
fn test_run_content_partial_failure() {
    let params = parameters(&[("thru", 1), ("missing", 4)]).into_validated().unwrap();
    let result = ComAnalysisOrchestrator::new(params)
        .run_content(CHANNEL_S2P, "ch-2")
        .unwrap();

    assert!(result.success);
    assert!(result.port_results["thru"].is_completed());
    assert_eq!(result.port_results["missing"].port(), 4);
    assert!(result.port_results["missing"].error().is_some());

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["port_results"]["missing"]["error"].is_string());
}

#[test]
fn test_malformed_content_is_format_error() {
    let params = parameters(&[("thru", 1)]).into_validated().unwrap();
    let err = ComAnalysisOrchestrator::new(params)
        .run_content("# GHz S RI\n1.0 0.1 0.2 0.3\n", "bad")
        .unwrap_err();
    assert!(matches!(err, ComError::Format(_)));
}
