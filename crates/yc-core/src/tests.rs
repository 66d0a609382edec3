//! Unit tests for yc-core primitives.

#[cfg(test)]
mod ids {
    use crate::{BoxId, EquipmentId, LaneId, RequestId};

    #[test]
    fn index_roundtrip() {
        let id = RequestId(42);
        assert_eq!(id.index(), 42);
        assert_eq!(RequestId::try_from(42usize).unwrap(), id);
    }

    #[test]
    fn ordering() {
        assert!(EquipmentId(0) < EquipmentId(1));
        assert!(BoxId(100) > BoxId(99));
    }

    #[test]
    fn invalid_sentinels_are_max() {
        assert_eq!(RequestId::INVALID.0, u32::MAX);
        assert_eq!(LaneId::INVALID.0, u16::MAX);
        assert_eq!(EquipmentId::default(), EquipmentId::INVALID);
    }

    #[test]
    fn display() {
        assert_eq!(BoxId(7).to_string(), "BoxId(7)");
    }

    #[test]
    fn narrow_id_rejects_overflow() {
        assert!(LaneId::try_from(70_000usize).is_err());
    }
}

#[cfg(test)]
mod geom {
    use crate::{Axis, Cell, Column, V3};

    #[test]
    fn axis_indices_are_dense() {
        let idx: Vec<usize> = Axis::ALL.iter().map(|a| a.index()).collect();
        assert_eq!(idx, vec![0, 1, 2]);
    }

    #[test]
    fn v3_get_and_with() {
        let v = V3::new(1.0, 2.0, 3.0);
        assert_eq!(v.get(Axis::Trolley), 2.0);
        let w = v.with(Axis::Hoist, 9.0);
        assert_eq!(w, V3::new(1.0, 2.0, 9.0));
        assert!(v.same_column(w, 1e-9));
    }

    #[test]
    fn column_projects_out_tier() {
        let a = Cell::new(3, 1, 0);
        let b = Cell::new(3, 1, 4);
        assert_eq!(a.column(), b.column());
        assert_eq!(a.column(), Column::new(3, 1));
        assert_eq!(Column::new(3, 1).cell(4), b);
    }
}

#[cfg(test)]
mod time {
    use crate::{Priority, SimClock, SimTime};

    #[test]
    fn sim_time_total_order() {
        assert!(SimTime(1.0) < SimTime(2.0));
        assert!(SimTime(1e12) < SimTime::FOREVER);
        assert_eq!(SimTime(3.5), SimTime::from(3.5));
        assert_eq!(SimTime(2.0).after(0.5), SimTime(2.5));
    }

    #[test]
    fn priority_domain_order() {
        assert!(Priority::Callback < Priority::Interrupt);
        assert!(Priority::Interrupt < Priority::InterferenceRelease);
        assert!(Priority::InterferenceRelease < Priority::OperationFinish);
        assert!(Priority::OperationFinish < Priority::Request);
        assert!(Priority::Request < Priority::TaskArrival);
        assert!(Priority::TaskArrival < Priority::Schedule);
        assert!(Priority::Schedule < Priority::Probe);
        assert!(Priority::Probe < Priority::Observe);
        assert!(Priority::Observe < Priority::Forever);
    }

    #[test]
    fn clock_is_monotonic() {
        let mut clock = SimClock::new();
        assert!(clock.advance_to(SimTime(10.0)));
        assert!(clock.advance_to(SimTime(10.0)));
        assert!(!clock.advance_to(SimTime(9.0)));
        assert_eq!(clock.now(), SimTime(10.0));
    }

    #[test]
    fn clock_display() {
        let mut clock = SimClock::new();
        clock.advance_to(SimTime(3_725.0));
        assert_eq!(clock.to_string(), "t=3725.00s (01:02:05)");
    }
}

#[cfg(test)]
mod config {
    use crate::YardConfig;

    #[test]
    fn default_is_valid() {
        assert!(YardConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_non_positive_grasp_time() {
        let cfg = YardConfig { grasp_time: 0.0, ..YardConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn check_clearance_adds_margin() {
        let cfg = YardConfig { clearance: 30.0, clearance_margin: 4.0, ..YardConfig::default() };
        assert_eq!(cfg.check_clearance(), 34.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn toml_partial_document_uses_defaults() {
        let cfg = YardConfig::from_toml_str("clearance = 20.0\nseed = 7\n").unwrap();
        assert_eq!(cfg.clearance, 20.0);
        assert_eq!(cfg.seed, 7);
        assert_eq!(cfg.grasp_time, YardConfig::default().grasp_time);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn toml_invalid_value_is_config_error() {
        assert!(YardConfig::from_toml_str("retry_backoff = -1.0\n").is_err());
    }
}

#[cfg(test)]
mod rng {
    use crate::SimRng;

    #[test]
    fn same_stream_same_draws() {
        let mut a = SimRng::stream(42, 3);
        let mut b = SimRng::stream(42, 3);
        for _ in 0..16 {
            assert_eq!(a.gen_range(0..1000u32), b.gen_range(0..1000u32));
        }
    }

    #[test]
    fn exp_gap_is_positive() {
        let mut rng = SimRng::new(1);
        for _ in 0..100 {
            assert!(rng.exp_gap(30.0) >= 0.0);
        }
    }
}
