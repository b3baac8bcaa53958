//! Grip hysteresis: grab на пересечении `grab_begin` снизу вверх,
//! release на пересечении `grab_end` сверху вниз.
//!
//! Значения внутри band (grab_end, grab_begin) ничего не переключают.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GripEdge {
    /// prev < begin <= current
    Pressed,
    /// prev > end >= current
    Released,
}

pub fn grip_edge(prev: f32, current: f32, grab_begin: f32, grab_end: f32) -> Option<GripEdge> {
    if prev < grab_begin && current >= grab_begin {
        Some(GripEdge::Pressed)
    } else if prev > grab_end && current <= grab_end {
        Some(GripEdge::Released)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BEGIN: f32 = 0.55;
    const END: f32 = 0.35;

    #[test]
    fn test_upward_crossing_presses() {
        assert_eq!(grip_edge(0.2, 0.6, BEGIN, END), Some(GripEdge::Pressed));
        // Ровно на threshold тоже считается
        assert_eq!(grip_edge(0.54, 0.55, BEGIN, END), Some(GripEdge::Pressed));
    }

    #[test]
    fn test_downward_crossing_releases() {
        assert_eq!(grip_edge(0.6, 0.3, BEGIN, END), Some(GripEdge::Released));
        assert_eq!(grip_edge(0.36, 0.35, BEGIN, END), Some(GripEdge::Released));
    }

    #[test]
    fn test_inside_band_no_edge() {
        assert_eq!(grip_edge(0.4, 0.5, BEGIN, END), None);
        assert_eq!(grip_edge(0.5, 0.4, BEGIN, END), None);
        // Уже выше begin: повторного press нет
        assert_eq!(grip_edge(0.6, 0.9, BEGIN, END), None);
        // Уже ниже end: повторного release нет
        assert_eq!(grip_edge(0.3, 0.1, BEGIN, END), None);
    }
}
