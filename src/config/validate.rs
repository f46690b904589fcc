// src/config/validate.rs

use std::collections::HashSet;
use std::time::Duration;

use crate::config::model::{FleetConfig, RawCamera, RawFleetConfig};
use crate::errors::{FleetError, Result};
use crate::shutdown::DEFAULT_GRACE_PERIOD;
use crate::types::{Target, parse_duration};

impl TryFrom<RawFleetConfig> for FleetConfig {
    type Error = FleetError;

    fn try_from(raw: RawFleetConfig) -> std::result::Result<Self, Self::Error> {
        let targets = validate_targets(&raw.camera)?;
        validate_detector(&raw)?;
        let grace_period = match raw.shutdown.grace_period.as_deref() {
            Some(value) => validate_grace_period(value)?,
            None => DEFAULT_GRACE_PERIOD,
        };

        Ok(FleetConfig::new_unchecked(
            raw.output.root,
            raw.detector,
            grace_period,
            targets,
        ))
    }
}

/// Validate the camera list and turn it into trimmed, order-preserving
/// [`Target`]s.
///
/// Fails on the first problem found; nothing is partially accepted:
/// - the list must not be empty
/// - tag and url must be non-empty after trimming
/// - tags must be unique (they name the output subdirectories)
pub fn validate_targets(cameras: &[RawCamera]) -> Result<Vec<Target>> {
    if cameras.is_empty() {
        return Err(FleetError::ConfigError(
            "config must contain at least one [[camera]] entry".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut targets = Vec::with_capacity(cameras.len());

    for (idx, cam) in cameras.iter().enumerate() {
        let target = Target::new(&cam.tag, &cam.url).map_err(|reason| {
            FleetError::ConfigError(format!("invalid camera #{idx} ({:?}): {reason}", cam.tag))
        })?;

        if !seen.insert(target.tag().to_string()) {
            return Err(FleetError::ConfigError(format!(
                "duplicate camera tag '{}' (camera #{idx})",
                target.tag()
            )));
        }

        targets.push(target);
    }

    Ok(targets)
}

fn validate_detector(cfg: &RawFleetConfig) -> Result<()> {
    if cfg.detector.program.trim().is_empty() {
        return Err(FleetError::ConfigError(
            "[detector].program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_grace_period(raw: &str) -> Result<Duration> {
    let grace = parse_duration(raw)
        .map_err(|e| FleetError::InvalidDuration(format!("[shutdown].grace_period: {e}")))?;

    if grace.is_zero() {
        return Err(FleetError::ConfigError(
            "[shutdown].grace_period must be greater than zero".to_string(),
        ));
    }

    Ok(grace)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_with(cameras: Vec<RawCamera>) -> RawFleetConfig {
        RawFleetConfig {
            output: Default::default(),
            detector: Default::default(),
            shutdown: Default::default(),
            camera: cameras,
        }
    }

    #[test]
    fn empty_camera_list_is_rejected() {
        let err = FleetConfig::try_from(raw_with(vec![])).unwrap_err();
        assert!(matches!(err, FleetError::ConfigError(msg) if msg.contains("at least one")));
    }

    #[test]
    fn one_blank_entry_rejects_the_whole_list() {
        let cams = vec![
            RawCamera::new("front", "rtsp://a"),
            RawCamera::new("back", "   "),
            RawCamera::new("side", "rtsp://c"),
        ];
        let err = validate_targets(&cams).unwrap_err();
        match err {
            FleetError::ConfigError(msg) => {
                assert!(msg.contains("#1"), "message should name the entry: {msg}");
                assert!(msg.contains("back"));
            }
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_tags_after_trimming_are_rejected() {
        let cams = vec![
            RawCamera::new("front", "rtsp://a"),
            RawCamera::new(" front ", "rtsp://b"),
        ];
        assert!(matches!(
            validate_targets(&cams),
            Err(FleetError::ConfigError(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn valid_list_keeps_order_and_trims() {
        let cams = vec![
            RawCamera::new(" b ", " rtsp://b "),
            RawCamera::new("a", "rtsp://a"),
        ];
        let targets = validate_targets(&cams).unwrap();
        let tags: Vec<_> = targets.iter().map(|t| t.tag()).collect();
        assert_eq!(tags, vec!["b", "a"]);
        assert_eq!(targets[0].url(), "rtsp://b");
    }

    #[test]
    fn zero_or_malformed_grace_period_is_rejected() {
        let mut raw = raw_with(vec![RawCamera::new("a", "rtsp://a")]);
        raw.shutdown.grace_period = Some("0s".to_string());
        assert!(matches!(
            FleetConfig::try_from(raw.clone()),
            Err(FleetError::ConfigError(_))
        ));

        raw.shutdown.grace_period = Some("soon".to_string());
        assert!(matches!(
            FleetConfig::try_from(raw),
            Err(FleetError::InvalidDuration(_))
        ));
    }

    #[test]
    fn empty_program_is_rejected() {
        let mut raw = raw_with(vec![RawCamera::new("a", "rtsp://a")]);
        raw.detector.program = " ".to_string();
        assert!(FleetConfig::try_from(raw).is_err());
    }

    #[test]
    fn defaults_apply_when_sections_are_missing() {
        let cfg = FleetConfig::try_from(raw_with(vec![RawCamera::new("a", "rtsp://a")])).unwrap();
        assert_eq!(cfg.grace_period(), DEFAULT_GRACE_PERIOD);
        assert_eq!(DEFAULT_GRACE_PERIOD, Duration::from_secs(8));
        assert_eq!(cfg.output_root(), std::path::Path::new("runs/hls"));
        assert_eq!(cfg.detector().program, "python3");
    }
}
