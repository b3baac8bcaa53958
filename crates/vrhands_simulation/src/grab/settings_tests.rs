//! Tests for grabber settings and rig validation.

#[cfg(test)]
mod tests {
    use super::super::settings::*;
    use crate::shared::Pose;

    #[test]
    fn test_settings_default() {
        let settings = GrabberSettings::default();
        assert_eq!(settings.grab_begin, 0.55);
        assert_eq!(settings.grab_end, 0.35);
        assert_eq!(settings.hand, HandSide::Left);
        assert!(!settings.parent_held_object);
        assert_eq!(settings.turn_deadzone, 0.4);
        assert_eq!(settings.snap_turn_degrees, 45.0);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let settings = GrabberSettings {
            grab_begin: 0.3,
            grab_end: 0.5,
            ..Default::default()
        };

        assert!(matches!(
            settings.validate(),
            Err(GrabConfigError::InvalidThresholds { .. })
        ));
    }

    #[test]
    fn test_equal_thresholds_rejected() {
        // Нулевой hysteresis band запрещён
        let settings = GrabberSettings {
            grab_begin: 0.5,
            grab_end: 0.5,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_deadzone_out_of_range_rejected() {
        let settings = GrabberSettings {
            turn_deadzone: 1.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(GrabConfigError::InvalidDeadzone(_))));
    }

    #[test]
    fn test_toml_partial_uses_defaults() {
        let settings = GrabberSettings::from_toml_str(
            r#"
            hand = "right"
            grab_begin = 0.7
            "#,
        )
        .unwrap();

        assert_eq!(settings.hand, HandSide::Right);
        assert_eq!(settings.grab_begin, 0.7);
        assert_eq!(settings.grab_end, 0.35);
    }

    #[test]
    fn test_toml_invalid_thresholds_fail() {
        let result = GrabberSettings::from_toml_str("grab_begin = 0.2\ngrab_end = 0.4\n");
        assert!(matches!(result, Err(GrabConfigError::InvalidThresholds { .. })));
    }

    #[test]
    fn test_non_finite_snap_turn_rejected() {
        for degrees in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, 720.0] {
            let settings = GrabberSettings {
                snap_turn_degrees: degrees,
                ..Default::default()
            };
            assert!(
                matches!(settings.validate(), Err(GrabConfigError::InvalidSnapTurn(_))),
                "snap_turn_degrees = {} accepted",
                degrees
            );
        }

        let left_turn = GrabberSettings {
            snap_turn_degrees: -90.0,
            ..Default::default()
        };
        assert!(left_turn.validate().is_ok());
    }

    #[test]
    fn test_toml_nan_snap_turn_fails() {
        let result = GrabberSettings::from_toml_str("snap_turn_degrees = nan");
        assert!(matches!(result, Err(GrabConfigError::InvalidSnapTurn(value)) if value.is_nan()));

        let result = GrabberSettings::from_toml_str("snap_turn_degrees = inf");
        assert!(matches!(result, Err(GrabConfigError::InvalidSnapTurn(_))));
    }

    #[test]
    fn test_toml_syntax_error() {
        let result = GrabberSettings::from_toml_str("grab_begin = = 0.2");
        assert!(matches!(result, Err(GrabConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let result = GrabberSettings::load_from_file(std::path::Path::new(
            "/definitely/not/here/grabber.toml",
        ));
        assert!(matches!(result, Err(GrabConfigError::Io(_))));
    }

    #[test]
    fn test_rig_requires_grip_anchor() {
        let rig: GrabberRig<u32> = GrabberRig {
            grab_volumes: vec![1],
            ..Default::default()
        };
        assert!(matches!(rig.validate(), Err(GrabConfigError::MissingGripAnchor)));
    }

    #[test]
    fn test_rig_requires_grab_volumes() {
        let rig: GrabberRig<u32> = GrabberRig::new(Pose::IDENTITY, Vec::new());
        assert!(matches!(rig.validate(), Err(GrabConfigError::NoGrabVolumes)));
    }
}
