use crate::types::{Business, BusStop, MeiStatus};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MeiSummary {
    pub total: usize,
    pub mei: usize,
    pub non_mei: usize,
    /// Share of MEI rows among all rows, in [0, 100]. Zero for an empty table.
    pub mei_percentage: f64,
}

pub fn mei_summary<'a, I>(records: I) -> MeiSummary
where
    I: IntoIterator<Item = &'a Business>,
{
    let (mut total, mut mei, mut non_mei) = (0, 0, 0);
    for record in records {
        total += 1;
        match record.mei {
            MeiStatus::Mei => mei += 1,
            MeiStatus::NonMei => non_mei += 1,
            MeiStatus::Unknown => {}
        }
    }
    let mei_percentage = if total > 0 {
        mei as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    MeiSummary { total, mei, non_mei, mei_percentage }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeiFilter {
    #[default]
    All,
    MeiOnly,
    NonMeiOnly,
}

impl MeiFilter {
    pub const ALL: [MeiFilter; 3] = [MeiFilter::All, MeiFilter::MeiOnly, MeiFilter::NonMeiOnly];

    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("mei") => MeiFilter::MeiOnly,
            Some("nao-mei") => MeiFilter::NonMeiOnly,
            _ => MeiFilter::All,
        }
    }

    pub fn param(&self) -> &'static str {
        match self {
            MeiFilter::All => "todas",
            MeiFilter::MeiOnly => "mei",
            MeiFilter::NonMeiOnly => "nao-mei",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeiFilter::All => "Todas",
            MeiFilter::MeiOnly => "Apenas MEIs",
            MeiFilter::NonMeiOnly => "Apenas Não-MEIs",
        }
    }

    pub fn matches(&self, business: &Business) -> bool {
        match self {
            MeiFilter::All => true,
            MeiFilter::MeiOnly => business.mei == MeiStatus::Mei,
            MeiFilter::NonMeiOnly => business.mei == MeiStatus::NonMei,
        }
    }
}

/// Keeps the indices in `rows` whose record passes `filter`.
pub fn filter_by_mei(records: &[Business], rows: &[usize], filter: MeiFilter) -> Vec<usize> {
    rows.iter().copied()
        .filter(|&i| filter.matches(&records[i]))
        .collect()
}

/// Keeps the indices in `rows` whose record is in exactly `neighborhood`.
pub fn filter_by_neighborhood(records: &[Business], rows: &[usize], neighborhood: &str) -> Vec<usize> {
    rows.iter().copied()
        .filter(|&i| records[i].neighborhood == neighborhood)
        .collect()
}

/// Row indices of the businesses matching both the flag filter and, if given, the neighborhood.
pub fn filter_businesses(records: &[Business], mei: MeiFilter, neighborhood: Option<&str>) -> Vec<usize> {
    let all: Vec<usize> = (0..records.len()).collect();
    let rows = filter_by_mei(records, &all, mei);
    match neighborhood {
        Some(name) => filter_by_neighborhood(records, &rows, name),
        None => rows,
    }
}

/// Case-insensitive substring search over trade name and CNAE description.
/// Returns matching row indices in table order. The query is used as typed;
/// only an empty query matches everything.
pub fn search_businesses(records: &[Business], query: &str) -> Vec<usize> {
    let needle = query.to_lowercase();
    if needle.is_empty() {
        return (0..records.len()).collect();
    }
    records.par_iter()
        .enumerate()
        .filter(|(_, b)| {
            b.trade_name.to_lowercase().contains(&needle)
                || b.cnae_description.to_lowercase().contains(&needle)
        })
        .map(|(i, _)| i)
        .collect()
}

/// Counts occurrences of `key` over `items`, then keeps the `n` largest groups.
///
/// Blank keys are not counted. Groups are ordered by count descending, ties by key ascending.
pub fn top_n<'a, T, I, F>(items: I, key: F, n: usize) -> Vec<(String, usize)>
where
    T: Sync + 'a,
    I: IntoParallelIterator<Item = &'a T>,
    F: Fn(&'a T) -> &'a str + Sync + Send,
{
    let counts = items.into_par_iter()
        .fold(HashMap::new, |mut acc: HashMap<&'a str, usize>, item| {
            let k = key(item);
            if !k.trim().is_empty() {
                *acc.entry(k).or_insert(0) += 1;
            }
            acc
        })
        .reduce(HashMap::new, |mut a, b| {
            for (k, v) in b {
                *a.entry(k).or_insert(0) += v;
            }
            a
        });

    let mut ranked: Vec<(String, usize)> = counts.into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(n);
    ranked
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TransportSummary {
    pub lines: usize,
    pub stops: usize,
    pub stops_per_line: f64,
}

pub fn transport_summary(stops: &[BusStop]) -> TransportSummary {
    let mut codes: Vec<&str> = stops.iter()
        .map(|s| s.line_code.as_str())
        .filter(|c| !c.trim().is_empty())
        .collect();
    codes.sort_unstable();
    codes.dedup();

    let lines = codes.len();
    let stops_per_line = if lines > 0 {
        stops.len() as f64 / lines as f64
    } else {
        0.0
    };
    TransportSummary { lines, stops: stops.len(), stops_per_line }
}

/// Shortens `label` to `width` characters followed by `...`.
pub fn truncate_label(label: &str, width: usize) -> String {
    match label.char_indices().nth(width) {
        Some((cut, _)) => format!("{}...", &label[..cut]),
        None => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business(name: &str, neighborhood: &str, cnae: &str, flag: &str) -> Business {
        Business {
            trade_name: name.to_string(),
            neighborhood: neighborhood.to_string(),
            cnae_code: String::new(),
            cnae_description: cnae.to_string(),
            mei: MeiStatus::from_flag(flag),
        }
    }

    fn sample() -> Vec<Business> {
        vec![
            business("Salão Bela", "Centro", "Cabeleireiros", "S"),
            business("Condomínio Alfa", "Buritis", "Condomínios prediais", "N"),
            business("BELEZA PURA", "Centro", "Cabeleireiros", "S"),
            business("Padaria", "Castelo", "Padaria e confeitaria", "N"),
            business("", "Centro", "Promoção de vendas", "S"),
            business("Mercado", "Buritis", "", "X"),
            business("Studio", "Buritis", "Cabeleireiros", "S"),
        ]
    }

    #[test]
    fn mei_percentage_matches_counts() {
        let records = sample();
        let summary = mei_summary(&records);
        assert_eq!(summary.total, 7);
        assert_eq!(summary.mei, 4);
        assert_eq!(summary.non_mei, 2);
        assert!((summary.mei_percentage - 4.0 / 7.0 * 100.0).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&summary.mei_percentage));
    }

    #[test]
    fn mei_percentage_of_empty_table_is_zero() {
        let summary = mei_summary(&Vec::<Business>::new());
        assert_eq!(summary.total, 0);
        assert_eq!(summary.mei_percentage, 0.0);
    }

    #[test]
    fn flag_and_neighborhood_filters_commute() {
        let records = sample();
        let all: Vec<usize> = (0..records.len()).collect();
        for filter in MeiFilter::ALL {
            for name in ["Centro", "Buritis", "Castelo", "Pampulha"] {
                let mei_first = filter_by_neighborhood(&records, &filter_by_mei(&records, &all, filter), name);
                let hood_first = filter_by_mei(&records, &filter_by_neighborhood(&records, &all, name), filter);
                assert_eq!(mei_first, hood_first);
            }
        }
    }

    #[test]
    fn combined_filter() {
        let records = sample();
        assert_eq!(filter_businesses(&records, MeiFilter::MeiOnly, Some("Centro")), vec![0, 2, 4]);
        assert_eq!(filter_businesses(&records, MeiFilter::NonMeiOnly, None), vec![1, 3]);
        assert_eq!(filter_businesses(&records, MeiFilter::All, None).len(), records.len());
    }

    #[test]
    fn unknown_flags_are_excluded_from_both_buckets() {
        let records = sample();
        let mei = filter_businesses(&records, MeiFilter::MeiOnly, None);
        let non_mei = filter_businesses(&records, MeiFilter::NonMeiOnly, None);
        assert!(!mei.contains(&5));
        assert!(!non_mei.contains(&5));
    }

    #[test]
    fn mei_filter_params() {
        for filter in MeiFilter::ALL {
            assert_eq!(MeiFilter::from_param(Some(filter.param())), filter);
        }
        assert_eq!(MeiFilter::from_param(Some("bogus")), MeiFilter::All);
        assert_eq!(MeiFilter::from_param(None), MeiFilter::All);
    }

    #[test]
    fn search_matches_either_column_case_insensitively() {
        let records = sample();
        assert_eq!(search_businesses(&records, "BELA"), vec![0]);
        assert_eq!(search_businesses(&records, "beleza"), vec![2]);

        let hits = search_businesses(&records, "CABELEIREIROS");
        assert_eq!(hits, vec![0, 2, 6]);

        let by_name: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].trade_name.to_lowercase().contains("a"))
            .collect();
        let by_cnae: Vec<usize> = (0..records.len())
            .filter(|&i| records[i].cnae_description.to_lowercase().contains("a"))
            .collect();
        let hits = search_businesses(&records, "a");
        for i in 0..records.len() {
            assert_eq!(hits.contains(&i), by_name.contains(&i) || by_cnae.contains(&i));
        }
        assert!(hits.iter().all(|&i| i < records.len()));
    }

    #[test]
    fn search_handles_accents_and_blank_query() {
        let records = sample();
        assert_eq!(search_businesses(&records, "CONDOMÍNIO"), vec![1]);
        assert_eq!(search_businesses(&records, "").len(), records.len());
        assert!(search_businesses(&records, "inexistente").is_empty());
    }

    #[test]
    fn search_keeps_surrounding_whitespace() {
        let records = vec![
            business("Studio Bela", "Centro", "", "S"),
            business("Bela Vista", "Centro", "", "S"),
            business("Casa Amarela", "Centro", "", "N"),
        ];
        assert_eq!(search_businesses(&records, "Bela "), vec![1]);
        assert_eq!(search_businesses(&records, " "), vec![0, 1, 2]);

        let single = vec![business("Mercado", "Centro", "Comercio", "N")];
        assert!(search_businesses(&single, " ").is_empty());
    }

    #[test]
    fn top_n_ranks_a_subset_by_reference() {
        let records = sample();
        let rows = filter_businesses(&records, MeiFilter::MeiOnly, None);
        let top = top_n(rows.par_iter().map(|&i| &records[i]), |b| b.cnae_description.as_str(), 1);
        assert_eq!(top, vec![("Cabeleireiros".to_string(), 3)]);
    }

    #[test]
    fn top_n_is_sorted_and_bounded() {
        let records = sample();
        let top = top_n(&records, |b| b.neighborhood.as_str(), 2);
        assert_eq!(top, vec![("Buritis".to_string(), 3), ("Centro".to_string(), 3)]);

        let all = top_n(&records, |b| b.neighborhood.as_str(), 10);
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].1 >= w[1].1));
    }

    #[test]
    fn top_n_skips_blank_keys() {
        let records = sample();
        let top = top_n(&records, |b| b.cnae_description.as_str(), 10);
        assert_eq!(top[0], ("Cabeleireiros".to_string(), 3));
        assert!(top.iter().all(|(k, _)| !k.is_empty()));
        assert_eq!(top.iter().map(|(_, c)| c).sum::<usize>(), 6);
    }

    #[test]
    fn transport_summary_counts_distinct_lines() {
        let stop = |code: &str| BusStop {
            line_code: code.to_string(),
            line_name: format!("Linha {}", code),
            origin: "BHTRANS".to_string(),
        };
        let stops = vec![stop("101"), stop("101"), stop("202"), stop("303")];
        let summary = transport_summary(&stops);
        assert_eq!(summary.lines, 3);
        assert_eq!(summary.stops, 4);
        assert!((summary.stops_per_line - 4.0 / 3.0).abs() < 1e-9);

        let empty = transport_summary(&[]);
        assert_eq!(empty.lines, 0);
        assert_eq!(empty.stops_per_line, 0.0);
    }

    #[test]
    fn labels_are_truncated_on_char_boundaries() {
        assert_eq!(truncate_label("curto", 40), "curto");
        assert_eq!(truncate_label("Promoção de vendas", 7), "Promoçã...");
        assert_eq!(truncate_label("abcdef", 6), "abcdef");
    }
}
