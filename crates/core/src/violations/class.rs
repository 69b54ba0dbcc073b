use std::fmt;

/// The behaviors the monitor flags.
///
/// Detector models are trained with a fixed class table; indices outside
/// it are not violations and are dropped at the decode stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ViolationClass {
    Sleeping,
    Phone,
    Food,
    Bottle,
}

impl ViolationClass {
    pub const ALL: [ViolationClass; 4] = [
        ViolationClass::Sleeping,
        ViolationClass::Phone,
        ViolationClass::Food,
        ViolationClass::Bottle,
    ];

    /// Maps a detector class index onto the class table.
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ViolationClass::Sleeping),
            1 => Some(ViolationClass::Phone),
            2 => Some(ViolationClass::Food),
            3 => Some(ViolationClass::Bottle),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ViolationClass::Sleeping => "sleeping",
            ViolationClass::Phone => "phone",
            ViolationClass::Food => "food",
            ViolationClass::Bottle => "bottle",
        }
    }

    /// Display color (RGB) for boxes, labels and chart bars.
    pub fn color(&self) -> [u8; 3] {
        match self {
            ViolationClass::Sleeping => [0, 255, 0],
            ViolationClass::Phone => [255, 0, 0],
            ViolationClass::Food => [255, 165, 0],
            ViolationClass::Bottle => [128, 0, 128],
        }
    }
}

impl fmt::Display for ViolationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::sleeping(0, ViolationClass::Sleeping)]
    #[case::phone(1, ViolationClass::Phone)]
    #[case::food(2, ViolationClass::Food)]
    #[case::bottle(3, ViolationClass::Bottle)]
    fn test_from_index(#[case] index: usize, #[case] expected: ViolationClass) {
        assert_eq!(ViolationClass::from_index(index), Some(expected));
    }

    #[rstest]
    #[case(4)]
    #[case(17)]
    #[case(usize::MAX)]
    fn test_from_index_unknown(#[case] index: usize) {
        assert_eq!(ViolationClass::from_index(index), None);
    }

    #[test]
    fn test_all_matches_index_order() {
        for (i, class) in ViolationClass::ALL.iter().enumerate() {
            assert_eq!(ViolationClass::from_index(i), Some(*class));
        }
    }

    #[test]
    fn test_display_uses_name() {
        assert_eq!(ViolationClass::Sleeping.to_string(), "sleeping");
        assert_eq!(ViolationClass::Bottle.name(), "bottle");
    }

    #[test]
    fn test_colors_are_distinct() {
        let colors: Vec<_> = ViolationClass::ALL.iter().map(|c| c.color()).collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
