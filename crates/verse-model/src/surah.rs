//! Static surah catalog: ayah counts and English names.
//!
//! Index 0 corresponds to surah 1 (Al-Fatiha).

/// Number of ayahs in each of the 114 surahs.
pub const AYAH_COUNTS: [u16; 114] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, 123, 111, 43, 52, 99, 128, 111, 110, 98, 135,
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, 34, 30, 73, 54, 45, 83, 182, 88, 75, 85, 54, 53,
    89, 59, 37, 35, 38, 29, 18, 45, 60, 49, 62, 55, 78, 96, 29, 22, 24, 13, 14, 11, 11, 18, 12,
    12, 30, 52, 52, 44, 28, 28, 20, 56, 40, 31, 50, 40, 46, 42, 29, 19, 36, 25, 22, 17, 19, 26,
    30, 20, 15, 21, 11, 8, 8, 19, 5, 8, 8, 11, 11, 8, 3, 9, 5, 4, 7, 3, 6, 3, 5, 4, 5, 6,
];

/// English surah names.
pub const SURAH_NAMES: [&str; 114] = [
    "Al-Fatiha",
    "Al-Baqarah",
    "Aal-E-Imran",
    "An-Nisa",
    "Al-Maidah",
    "Al-Anam",
    "Al-Araf",
    "Al-Anfal",
    "At-Tawbah",
    "Yunus",
    "Hud",
    "Yusuf",
    "Ar-Rad",
    "Ibrahim",
    "Al-Hijr",
    "An-Nahl",
    "Al-Isra",
    "Al-Kahf",
    "Maryam",
    "Ta-Ha",
    "Al-Anbiya",
    "Al-Hajj",
    "Al-Muminun",
    "An-Nur",
    "Al-Furqan",
    "Ash-Shuara",
    "An-Naml",
    "Al-Qasas",
    "Al-Ankabut",
    "Ar-Rum",
    "Luqman",
    "As-Sajdah",
    "Al-Ahzab",
    "Saba",
    "Fatir",
    "Ya-Sin",
    "As-Saffat",
    "Sad",
    "Az-Zumar",
    "Ghafir",
    "Fussilat",
    "Ash-Shura",
    "Az-Zukhruf",
    "Ad-Dukhan",
    "Al-Jathiyah",
    "Al-Ahqaf",
    "Muhammad",
    "Al-Fath",
    "Al-Hujurat",
    "Qaf",
    "Adh-Dhariyat",
    "At-Tur",
    "An-Najm",
    "Al-Qamar",
    "Ar-Rahman",
    "Al-Waqiah",
    "Al-Hadid",
    "Al-Mujadila",
    "Al-Hashr",
    "Al-Mumtahanah",
    "As-Saff",
    "Al-Jumuah",
    "Al-Munafiqun",
    "At-Taghabun",
    "At-Talaq",
    "At-Tahrim",
    "Al-Mulk",
    "Al-Qalam",
    "Al-Haqqah",
    "Al-Maarij",
    "Nuh",
    "Al-Jinn",
    "Al-Muzzammil",
    "Al-Muddaththir",
    "Al-Qiyamah",
    "Al-Insan",
    "Al-Mursalat",
    "An-Naba",
    "An-Naziat",
    "Abasa",
    "At-Takwir",
    "Al-Infitar",
    "Al-Mutaffifin",
    "Al-Inshiqaq",
    "Al-Buruj",
    "At-Tariq",
    "Al-Ala",
    "Al-Ghashiyah",
    "Al-Fajr",
    "Al-Balad",
    "Ash-Shams",
    "Al-Layl",
    "Ad-Duha",
    "Ash-Sharh",
    "At-Tin",
    "Al-Alaq",
    "Al-Qadr",
    "Al-Bayyinah",
    "Az-Zalzalah",
    "Al-Adiyat",
    "Al-Qariah",
    "At-Takathur",
    "Al-Asr",
    "Al-Humazah",
    "Al-Fil",
    "Quraysh",
    "Al-Maun",
    "Al-Kawthar",
    "Al-Kafirun",
    "An-Nasr",
    "Al-Masad",
    "Al-Ikhlas",
    "Al-Falaq",
    "An-Nas",
];

/// Total number of surahs.
pub const SURAH_COUNT: u16 = 114;

/// Ayah count for a surah number (1-based), if valid.
pub fn ayah_count(surah: u16) -> Option<u16> {
    if (1..=SURAH_COUNT).contains(&surah) {
        Some(AYAH_COUNTS[surah as usize - 1])
    } else {
        None
    }
}

/// English name for a surah number (1-based), if valid.
pub fn surah_name(surah: u16) -> Option<&'static str> {
    if (1..=SURAH_COUNT).contains(&surah) {
        Some(SURAH_NAMES[surah as usize - 1])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_114_entries() {
        assert_eq!(AYAH_COUNTS.len(), 114);
        assert_eq!(SURAH_NAMES.len(), 114);
    }

    #[test]
    fn known_counts_match() {
        assert_eq!(ayah_count(1), Some(7));
        assert_eq!(ayah_count(2), Some(286));
        assert_eq!(ayah_count(103), Some(3));
        assert_eq!(ayah_count(114), Some(6));
    }

    #[test]
    fn known_names_match() {
        assert_eq!(surah_name(1), Some("Al-Fatiha"));
        assert_eq!(surah_name(2), Some("Al-Baqarah"));
        assert_eq!(surah_name(114), Some("An-Nas"));
    }

    #[test]
    fn out_of_range_is_none() {
        assert_eq!(ayah_count(0), None);
        assert_eq!(ayah_count(115), None);
        assert_eq!(surah_name(0), None);
        assert_eq!(surah_name(115), None);
    }
}
