use num_complex::Complex32;

use super::Dibit;

/// Decide the dibit for a differential symbol that has been rotated by +π/4 so the
/// four constellation points sit on the axes.
pub fn slice(symbol: Complex32) -> Dibit {
    if symbol.re.abs() > symbol.im.abs() {
        if symbol.re > 0.0 {
            Dibit::D10Minus1
        } else {
            Dibit::D01Plus3
        }
    } else if symbol.im > 0.0 {
        Dibit::D00Plus1
    } else {
        Dibit::D11Minus3
    }
}

/// Slicer that optionally applies the inverted dibit table.
#[derive(Clone, Copy, Debug, Default)]
pub struct Slicer {
    inverted: bool,
}

impl Slicer {
    pub fn new(inverted: bool) -> Self {
        Self { inverted }
    }

    pub fn decide(&self, symbol: Complex32) -> Dibit {
        let dibit = slice(symbol);
        if self.inverted {
            dibit.inverted()
        } else {
            dibit
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_4;
    use test_case::test_case;

    #[test_case(Dibit::D00Plus1)]
    #[test_case(Dibit::D01Plus3)]
    #[test_case(Dibit::D10Minus1)]
    #[test_case(Dibit::D11Minus3)]
    fn rotated_ideal_points(dibit: Dibit) {
        let symbol = Complex32::from_polar(1.0, dibit.phase() + FRAC_PI_4);
        assert_eq!(slice(symbol), dibit);
        // tolerate a phase error just short of the decision boundary
        let skewed = Complex32::from_polar(0.4, dibit.phase() + FRAC_PI_4 + 0.7);
        assert_eq!(slice(skewed), dibit);
    }

    #[test]
    fn inverted_table() {
        let symbol = Complex32::new(0.0, 1.0);
        assert_eq!(Slicer::new(false).decide(symbol), Dibit::D00Plus1);
        assert_eq!(Slicer::new(true).decide(symbol), Dibit::D10Minus1);
    }
}
