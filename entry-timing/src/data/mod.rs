pub mod loader;
pub mod prepare;
pub mod types;

pub use loader::{read_ndjson, write_json_file, write_ndjson, write_ndjson_file, DataLoader, LoaderError};
pub use prepare::{
    prepare_model_rows, segment_key, DecisionRecord, ModelRow, PreparedDecisions, CATEGORICAL_FIELDS,
    NUMERIC_KEYS, UNKNOWN,
};
pub use types::{format_timestamp_ms, parse_timestamp_ms, safe_f64, LabeledRecord, RawDecisionRow, RawLeg};
