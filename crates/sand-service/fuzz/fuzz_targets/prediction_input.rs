#![no_main]

use libfuzzer_sys::fuzz_target;
use sand_service::inference::parse_receipt_month;
use sand_service::masterdata::LookupTables;
use sand_service::models::{parse_measurement, PredictionForm, PredictionRequest};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let _ = parse_receipt_month(s);
    let _ = parse_measurement(s, "fines");
    let _ = LookupTables::from_json_str(s);

    // Split into the five form fields
    let mut parts = s.splitn(5, '&').map(|p| Some(p.to_string()));
    let form = PredictionForm {
        date_receive: parts.next().flatten(),
        plant: parts.next().flatten(),
        vendor: parts.next().flatten(),
        fines: parts.next().flatten(),
        bulk: parts.next().flatten(),
    };
    if let Ok(request) = PredictionRequest::try_from(form) {
        assert!(request.fines.is_finite() && request.bulk.is_finite());
    }
});
