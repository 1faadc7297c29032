//! InfluxDB 라인 프로토콜 인코딩.
//!
//! `measurement[,tag=v...] field=v[,field=v...] timestamp_ns` 형식.
//! measurement/태그의 쉼표·공백·등호, 문자열 필드 값의 따옴표·백슬래시를
//! 이스케이프한다. 타임스탬프의 나노초 변환은 이 경계에서만 일어난다.

use netpulse_core::error::TelemetryError;
use netpulse_core::models::point::{DataPoint, FieldValue};

/// 데이터 포인트 → 라인 프로토콜 한 줄
///
/// 필드가 하나도 없는 포인트는 거부한다 (빈 레코드는 상류에서
/// 걸러졌어야 한다).
pub fn encode(point: &DataPoint) -> Result<String, TelemetryError> {
    if point.fields.is_empty() {
        return Err(TelemetryError::Storage(
            "필드 없는 포인트는 기록 불가".to_string(),
        ));
    }

    let mut line = escape_key(&point.measurement);
    for (key, value) in &point.tags {
        line.push(',');
        line.push_str(&escape_key(key));
        line.push('=');
        line.push_str(&escape_key(value));
    }

    line.push(' ');
    let mut first = true;
    for (metric, value) in point.fields.iter() {
        if !first {
            line.push(',');
        }
        first = false;
        line.push_str(metric.name());
        line.push('=');
        match value {
            FieldValue::Float(v) => line.push_str(&v.to_string()),
            FieldValue::Int(v) => {
                line.push_str(&v.to_string());
                line.push('i');
            }
            FieldValue::Str(v) => {
                line.push('"');
                line.push_str(&escape_string_value(v));
                line.push('"');
            }
        }
    }

    line.push(' ');
    line.push_str(&(point.timestamp as i128 * 1_000_000_000).to_string());
    Ok(line)
}

/// measurement/태그 키·값 이스케이프: 쉼표, 공백, 등호
fn escape_key(raw: &str) -> String {
    raw.replace(',', "\\,")
        .replace('=', "\\=")
        .replace(' ', "\\ ")
}

/// 문자열 필드 값 이스케이프: 백슬래시, 따옴표
fn escape_string_value(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}
