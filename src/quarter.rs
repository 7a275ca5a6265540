/// Calendar-quarter buckets for grouping files by creation month.
///
/// The year is split into four fixed 3-month buckets. Each bucket maps to a
/// directory name with a two-digit ordinal prefix so the buckets sort in
/// calendar order.
///
/// # Examples
///
/// ```
/// use chronosort::quarter::Quarter;
///
/// assert_eq!(Quarter::of_month(5), Quarter::AprToJun);
/// assert_eq!(Quarter::of_month(5).dir_name(), "01_apr_to_jun");
/// assert_eq!(Quarter::of_month(12).dir_name(), "03_oct_to_dec");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    /// January through March.
    JanToMar,
    /// April through June.
    AprToJun,
    /// July through September.
    JulToSep,
    /// October through December.
    OctToDec,
}

impl Quarter {
    /// Returns the quarter containing the given calendar month (1 = January).
    ///
    /// Months outside 1-12 cannot come out of a valid timestamp, so any other
    /// value panics as an internal consistency failure.
    pub fn of_month(month: u32) -> Self {
        match (month - 1) / 3 {
            0 => Quarter::JanToMar,
            1 => Quarter::AprToJun,
            2 => Quarter::JulToSep,
            3 => Quarter::OctToDec,
            index => unreachable!("invalid quarter index: {}", index),
        }
    }

    /// Returns the directory name for this quarter.
    ///
    /// # Examples
    ///
    /// ```
    /// use chronosort::quarter::Quarter;
    ///
    /// assert_eq!(Quarter::JanToMar.dir_name(), "00_jan_to_mar");
    /// assert_eq!(Quarter::OctToDec.dir_name(), "03_oct_to_dec");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Quarter::JanToMar => "00_jan_to_mar",
            Quarter::AprToJun => "01_apr_to_jun",
            Quarter::JulToSep => "02_jul_to_sep",
            Quarter::OctToDec => "03_oct_to_dec",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_month_covers_all_months() {
        assert_eq!(Quarter::of_month(1), Quarter::JanToMar);
        assert_eq!(Quarter::of_month(2), Quarter::JanToMar);
        assert_eq!(Quarter::of_month(3), Quarter::JanToMar);
        assert_eq!(Quarter::of_month(4), Quarter::AprToJun);
        assert_eq!(Quarter::of_month(5), Quarter::AprToJun);
        assert_eq!(Quarter::of_month(6), Quarter::AprToJun);
        assert_eq!(Quarter::of_month(7), Quarter::JulToSep);
        assert_eq!(Quarter::of_month(8), Quarter::JulToSep);
        assert_eq!(Quarter::of_month(9), Quarter::JulToSep);
        assert_eq!(Quarter::of_month(10), Quarter::OctToDec);
        assert_eq!(Quarter::of_month(11), Quarter::OctToDec);
        assert_eq!(Quarter::of_month(12), Quarter::OctToDec);
    }

    #[test]
    fn test_quarter_dir_names() {
        assert_eq!(Quarter::JanToMar.dir_name(), "00_jan_to_mar");
        assert_eq!(Quarter::AprToJun.dir_name(), "01_apr_to_jun");
        assert_eq!(Quarter::JulToSep.dir_name(), "02_jul_to_sep");
        assert_eq!(Quarter::OctToDec.dir_name(), "03_oct_to_dec");
    }

    #[test]
    fn test_quarter_boundaries() {
        // The first and last month of each bucket land in the same bucket.
        assert_eq!(Quarter::of_month(1), Quarter::of_month(3));
        assert_eq!(Quarter::of_month(4), Quarter::of_month(6));
        assert_eq!(Quarter::of_month(7), Quarter::of_month(9));
        assert_eq!(Quarter::of_month(10), Quarter::of_month(12));
        assert_ne!(Quarter::of_month(3), Quarter::of_month(4));
        assert_ne!(Quarter::of_month(9), Quarter::of_month(10));
    }
}
