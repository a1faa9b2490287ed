/// First cell of every header line in an SPC storm-report CSV.
const HEADER_MARKER: &str = "Time";

/// Storm-report category, selected by the second cell of a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportCategory {
    Tornado,
    Wind,
    Hail,
}

impl ReportCategory {
    /// Render order.
    pub const ALL: [ReportCategory; 3] = [Self::Tornado, Self::Wind, Self::Hail];

    fn from_header_cell(cell: &str) -> Option<Self> {
        match cell {
            "F_Scale" => Some(Self::Tornado),
            "Speed" => Some(Self::Wind),
            "Size" => Some(Self::Hail),
            _ => None,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Tornado => "Tornado",
            Self::Wind => "Wind",
            Self::Hail => "Hail",
        }
    }
}

/// One category's header and rows, exactly as they appeared in the CSV.
///
/// Row length is not checked against the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The three categorized tables of a storm-report CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportSet {
    pub tornado: ReportTable,
    pub wind: ReportTable,
    pub hail: ReportTable,
}

impl ReportSet {
    /// Split a storm-report CSV into categorized tables.
    ///
    /// Cells are split on bare commas; quoted fields with embedded commas are
    /// not supported. A line whose first cell is `Time` starts a new block and
    /// its second cell picks the category. Every following line, blank or
    /// malformed ones included, is a row of that category until the next
    /// header. Lines before the first header are dropped, as are lines under
    /// a header whose category is unrecognized.
    ///
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(csv: &str) -> Option<Self> {
        if csv.trim().is_empty() {
            return None;
        }

        let mut set = Self::default();
        let mut current: Option<ReportCategory> = None;

        for line in csv.lines() {
            let cells: Vec<String> = line.split(',').map(str::to_string).collect();

            if cells.first().map(String::as_str) == Some(HEADER_MARKER) {
                current = cells
                    .get(1)
                    .and_then(|cell| ReportCategory::from_header_cell(cell));
                match current {
                    Some(category) => set.table_mut(category).header = cells,
                    None => tracing::debug!(line, "Header line with unknown category, skipping block"),
                }
                continue;
            }

            if let Some(category) = current {
                set.table_mut(category).rows.push(cells);
            }
        }

        Some(set)
    }

    pub fn table(&self, category: ReportCategory) -> &ReportTable {
        match category {
            ReportCategory::Tornado => &self.tornado,
            ReportCategory::Wind => &self.wind,
            ReportCategory::Hail => &self.hail,
        }
    }

    fn table_mut(&mut self, category: ReportCategory) -> &mut ReportTable {
        match category {
            ReportCategory::Tornado => &mut self.tornado,
            ReportCategory::Wind => &mut self.wind,
            ReportCategory::Hail => &mut self.hail,
        }
    }

    /// Tables in render order: Tornado, Wind, Hail.
    pub fn iter(&self) -> impl Iterator<Item = (ReportCategory, &ReportTable)> {
        ReportCategory::ALL
            .into_iter()
            .map(move |category| (category, self.table(category)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const TODAY_CSV: &str = "\
Time,F_Scale,Location,County,State,Lat,Lon,Comments
1705,UNK,3 N Dodge City,Ford,KS,37.80,-100.02,Brief tornado (DDC)
1730,EF1,Spearville,Ford,KS,37.85,-99.75,Damage to outbuildings (DDC)
Time,Speed,Location,County,State,Lat,Lon,Comments
1612,UNK,Salina,Saline,KS,38.84,-97.61,Trees down (ICT)
1640,65,2 W Abilene,Dickinson,KS,38.92,-97.25,Measured gust (TOP)
Time,Size,Location,County,State,Lat,Lon,Comments
1550,175,Hays,Ellis,KS,38.88,-99.33,Golf ball hail (GLD)
1600,100,Russell,Russell,KS,38.89,-98.86,Quarter hail (GLD)
";

    fn row(line: &str) -> Vec<String> {
        line.split(',').map(str::to_string).collect()
    }

    #[test]
    fn test_three_blocks_categorized() {
        let set = ReportSet::parse(TODAY_CSV).unwrap();

        assert_eq!(set.tornado.rows.len(), 2);
        assert_eq!(set.wind.rows.len(), 2);
        assert_eq!(set.hail.rows.len(), 2);

        assert_eq!(
            set.tornado.header,
            row("Time,F_Scale,Location,County,State,Lat,Lon,Comments")
        );
        assert_eq!(set.wind.header[1], "Speed");
        assert_eq!(set.hail.header[1], "Size");

        assert_eq!(set.tornado.rows[0][2], "3 N Dodge City");
        assert_eq!(set.tornado.rows[1][0], "1730");
        assert_eq!(set.hail.rows[1][2], "Russell");
    }

    #[test]
    fn test_iter_order_is_tornado_wind_hail() {
        let set = ReportSet::parse(TODAY_CSV).unwrap();
        let order: Vec<&str> = set.iter().map(|(c, _)| c.title()).collect();
        assert_eq!(order, vec!["Tornado", "Wind", "Hail"]);
    }

    #[test]
    fn test_lines_before_first_header_dropped() {
        let csv = "garbage,line\nTime,Speed,Location\n1200,50,Here\n";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(set.wind.rows, vec![row("1200,50,Here")]);
        assert!(set.tornado.rows.is_empty());
        assert!(set.hail.rows.is_empty());
    }

    #[test]
    fn test_malformed_and_blank_lines_pass_through() {
        let csv = "Time,Size,Location\n1200\n\n1300,100,There,extra,cells\n";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(
            set.hail.rows,
            vec![
                vec!["1200".to_string()],
                vec![String::new()],
                row("1300,100,There,extra,cells"),
            ]
        );
    }

    #[test]
    fn test_embedded_commas_split_naively() {
        let csv = "Time,F_Scale,Comments\n1200,EF0,\"Roof damage, trees down\"\n";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(set.tornado.rows[0].len(), 4);
    }

    #[test]
    fn test_unknown_category_block_skipped() {
        let csv = "Time,Mystery,X\n1,2,3\nTime,Speed,X\n4,5,6\n";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(set.wind.rows, vec![row("4,5,6")]);
        assert!(set.tornado.rows.is_empty());
    }

    #[test]
    fn test_header_without_rows() {
        let csv = "Time,F_Scale,Location\nTime,Speed,Location\nTime,Size,Location";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(set.tornado.header.len(), 3);
        assert!(set.tornado.rows.is_empty());
        assert!(set.wind.rows.is_empty());
        assert!(set.hail.rows.is_empty());
    }

    #[test]
    fn test_crlf_line_endings() {
        let csv = "Time,Size,Location\r\n1200,100,Here\r\n";
        let set = ReportSet::parse(csv).unwrap();
        assert_eq!(set.hail.rows, vec![row("1200,100,Here")]);
    }

    #[test]
    fn test_empty_input_is_no_data() {
        assert_eq!(ReportSet::parse(""), None);
        assert_eq!(ReportSet::parse("  \n\t\n"), None);
    }
}
