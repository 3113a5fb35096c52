//! Transaction Cluster Detection
//!
//! Finds price levels where executed prints concentrate.
//!
//! Two strategies:
//! - Exact: prices rounded to cents and grouped; whale support levels.
//! - Proximity: prints within a radius of an anchor price are pooled;
//!   dark-pool cluster levels priced at the mean of their members.
//!
//! The default proximity pass is greedy and depends on input order: the
//! first unassigned print anchors a cluster and claims every unassigned
//! print within the radius of the anchor. `ProximityStrategy::SortedMerge`
//! is an order-independent alternative (sort, then merge neighbours).
//!
//! Both strategies return levels sorted by print count, highest first.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use crate::analytics::error::AnalyticsError;
use crate::analytics::params::{ClusterParams, ProximityStrategy};
use crate::domain::{KeyLevel, KeyLevelKind, Strength, Transaction};

/// Price rounded to whole cents
fn cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}

/// Running totals for one group of prints
#[derive(Debug, Default)]
struct LevelAccumulator {
    count: usize,
    price_sum: f64,
    total_volume: f64,
    total_premium: f64,
    institutions: Vec<String>,
    last_executed_at: Option<DateTime<Utc>>,
}

impl LevelAccumulator {
    fn add(&mut self, tx: &Transaction, max_institutions: usize) {
        self.count += 1;
        self.price_sum += tx.price;
        self.total_volume += tx.volume;
        self.total_premium += tx.premium;
        self.last_executed_at = match self.last_executed_at {
            Some(t) if t >= tx.executed_at => Some(t),
            _ => Some(tx.executed_at),
        };
        if let Some(name) = tx.institution.as_deref() {
            if self.institutions.len() < max_institutions
                && !name.is_empty()
                && !self.institutions.iter().any(|i| i == name)
            {
                self.institutions.push(name.to_string());
            }
        }
    }

    fn into_level(self, price: f64, kind: KeyLevelKind) -> KeyLevel {
        KeyLevel {
            price,
            kind,
            strength: Strength::from_count(self.count),
            transaction_count: self.count,
            total_volume: self.total_volume,
            total_premium: self.total_premium,
            institutions: self.institutions,
            last_executed_at: self.last_executed_at,
        }
    }
}

/// Key level detector over executed prints
#[derive(Debug, Clone, Default)]
pub struct TransactionClusterDetector {
    params: ClusterParams,
}

impl TransactionClusterDetector {
    pub fn new(params: ClusterParams) -> Self {
        Self { params }
    }

    /// Override the density threshold
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.params.density_threshold = threshold;
        self
    }

    /// Override the proximity radius
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.params.proximity_radius = radius;
        self
    }

    pub fn with_strategy(mut self, strategy: ProximityStrategy) -> Self {
        self.params.proximity_strategy = strategy;
        self
    }

    pub fn params(&self) -> &ClusterParams {
        &self.params
    }

    fn check_params(&self) -> Result<(), AnalyticsError> {
        self.params
            .validate()
            .map_err(|e| AnalyticsError::InvalidParameter(e.to_string()))
    }

    /// Group prints on identical cent prices; whale support levels
    pub fn exact_levels(&self, transactions: &[Transaction]) -> Result<Vec<KeyLevel>, AnalyticsError> {
        self.check_params()?;

        let mut groups: BTreeMap<i64, LevelAccumulator> = BTreeMap::new();
        for tx in transactions.iter().filter(|tx| tx.price.is_finite()) {
            groups
                .entry(cents(tx.price))
                .or_default()
                .add(tx, self.params.max_institutions);
        }

        let mut levels: Vec<KeyLevel> = groups
            .into_iter()
            .filter(|(_, acc)| acc.count >= self.params.density_threshold)
            .map(|(key, acc)| acc.into_level(key as f64 / 100.0, KeyLevelKind::WhaleSupport))
            .collect();

        levels.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));

        tracing::debug!(
            transactions = transactions.len(),
            levels = levels.len(),
            threshold = self.params.density_threshold,
            "exact price grouping"
        );
        Ok(levels)
    }

    /// Pool prints within the proximity radius; dark-pool cluster levels
    pub fn proximity_levels(&self, transactions: &[Transaction]) -> Result<Vec<KeyLevel>, AnalyticsError> {
        self.check_params()?;

        let clusters = self.cluster_indices(transactions);
        let mut levels: Vec<KeyLevel> = clusters
            .into_iter()
            .filter(|members| members.len() >= self.params.density_threshold)
            .map(|members| {
                let mut acc = LevelAccumulator::default();
                for &i in &members {
                    acc.add(&transactions[i], self.params.max_institutions);
                }
                let mean = acc.price_sum / acc.count as f64;
                acc.into_level(mean, KeyLevelKind::DarkPoolCluster)
            })
            .collect();

        levels.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));

        tracing::debug!(
            transactions = transactions.len(),
            levels = levels.len(),
            radius = self.params.proximity_radius,
            strategy = ?self.params.proximity_strategy,
            "proximity clustering"
        );
        Ok(levels)
    }

    /// Partition print indices into proximity clusters.
    ///
    /// Every index with a finite price lands in exactly one cluster.
    pub fn cluster_indices(&self, transactions: &[Transaction]) -> Vec<Vec<usize>> {
        match self.params.proximity_strategy {
            ProximityStrategy::Greedy => greedy_clusters(transactions, self.params.proximity_radius),
            ProximityStrategy::SortedMerge => sorted_merge_clusters(transactions, self.params.proximity_radius),
        }
    }
}

fn greedy_clusters(transactions: &[Transaction], radius: f64) -> Vec<Vec<usize>> {
    let mut assigned: Vec<bool> = transactions.iter().map(|tx| !tx.price.is_finite()).collect();
    let mut clusters = Vec::new();

    for anchor in 0..transactions.len() {
        if assigned[anchor] {
            continue;
        }
        let anchor_price = transactions[anchor].price;
        let mut members = Vec::new();
        for (i, tx) in transactions.iter().enumerate().skip(anchor) {
            if !assigned[i] && (tx.price - anchor_price).abs() <= radius {
                assigned[i] = true;
                members.push(i);
            }
        }
        clusters.push(members);
    }

    clusters
}

fn sorted_merge_clusters(transactions: &[Transaction], radius: f64) -> Vec<Vec<usize>> {
    let mut order: Vec<usize> = (0..transactions.len())
        .filter(|&i| transactions[i].price.is_finite())
        .collect();
    order.sort_by(|&a, &b| transactions[a].price.total_cmp(&transactions[b].price));

    let mut clusters: Vec<Vec<usize>> = Vec::new();
    let mut previous: Option<f64> = None;
    for i in order {
        let price = transactions[i].price;
        match (previous, clusters.last_mut()) {
            (Some(prev), Some(current)) if price - prev <= radius => current.push(i),
            _ => clusters.push(vec![i]),
        }
        previous = Some(price);
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(price: f64) -> Transaction {
        Transaction::new(price, 1_000.0, price * 1_000.0, Utc.with_ymd_and_hms(2026, 10, 16, 14, 0, 0).unwrap())
    }

    fn txs(prices: &[f64]) -> Vec<Transaction> {
        prices.iter().map(|&p| tx(p)).collect()
    }

    #[test]
    fn test_exact_grouping_threshold() {
        let mut prints = txs(&[100.0; 6]);
        prints.extend(txs(&[150.0; 4]));

        let levels = TransactionClusterDetector::default().exact_levels(&prints).unwrap();

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 100.0);
        assert_eq!(levels[0].transaction_count, 6);
        assert_eq!(levels[0].kind, KeyLevelKind::WhaleSupport);
        assert_eq!(levels[0].strength, Strength::Low);
        assert_eq!(levels[0].total_volume, 6_000.0);
        assert_eq!(levels[0].total_premium, 600_000.0);
    }

    #[test]
    fn test_exact_grouping_rounds_to_cents() {
        let prints = txs(&[99.999, 100.001, 100.004, 100.0, 99.996]);
        let levels = TransactionClusterDetector::default().exact_levels(&prints).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].price, 100.0);
        assert_eq!(levels[0].transaction_count, 5);
    }

    #[test]
    fn test_exact_grouping_sorted_by_count() {
        let mut prints = txs(&[50.0; 5]);
        prints.extend(txs(&[75.0; 11]));
        prints.extend(txs(&[60.0; 8]));

        let levels = TransactionClusterDetector::default().exact_levels(&prints).unwrap();

        let counts: Vec<_> = levels.iter().map(|l| l.transaction_count).collect();
        assert_eq!(counts, vec![11, 8, 5]);
        assert_eq!(levels[0].strength, Strength::High);
        assert_eq!(levels[1].strength, Strength::Medium);
        assert_eq!(levels[2].strength, Strength::Low);
    }

    #[test]
    fn test_institutions_capped_and_distinct() {
        let names = ["JPM", "GS", "JPM", "MS", "CITI", "UBS", "BARC", "GS"];
        let prints: Vec<_> = names.iter().map(|n| tx(42.0).with_institution(*n)).collect();

        let levels = TransactionClusterDetector::default().exact_levels(&prints).unwrap();

        assert_eq!(levels[0].institutions, vec!["JPM", "GS", "MS", "CITI", "UBS"]);
    }

    #[test]
    fn test_last_executed_at_is_newest() {
        let mut prints = txs(&[10.0; 5]);
        let newest = Utc.with_ymd_and_hms(2026, 10, 17, 9, 30, 0).unwrap();
        prints[2].executed_at = newest;

        let levels = TransactionClusterDetector::default().exact_levels(&prints).unwrap();
        assert_eq!(levels[0].last_executed_at, Some(newest));
    }

    #[test]
    fn test_proximity_mean_price() {
        let prints = txs(&[100.0, 100.2, 99.8, 100.4, 99.6, 120.0]);
        let levels = TransactionClusterDetector::default().proximity_levels(&prints).unwrap();

        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].kind, KeyLevelKind::DarkPoolCluster);
        assert_eq!(levels[0].transaction_count, 5);
        assert!((levels[0].price - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_greedy_is_anchored_on_first_print() {
        // 100.0 anchors; 100.4 and 100.5 join, 100.9 is out of reach of the
        // anchor even though it is within 0.5 of 100.5.
        let prints = txs(&[100.0, 100.4, 100.9, 100.5, 101.3]);
        let detector = TransactionClusterDetector::default();

        let clusters = detector.cluster_indices(&prints);
        assert_eq!(clusters, vec![vec![0, 1, 3], vec![2, 4]]);
    }

    #[test]
    fn test_greedy_depends_on_order() {
        let detector = TransactionClusterDetector::default();
        let forward = detector.cluster_indices(&txs(&[10.0, 10.4, 10.8]));
        let reversed = detector.cluster_indices(&txs(&[10.4, 10.0, 10.8]));

        assert_eq!(forward.len(), 2);
        assert_eq!(reversed.len(), 1);
    }

    #[test]
    fn test_sorted_merge_chains_neighbours() {
        let detector = TransactionClusterDetector::default().with_strategy(ProximityStrategy::SortedMerge);
        let forward = detector.cluster_indices(&txs(&[10.0, 10.4, 10.8, 12.0]));
        let shuffled = detector.cluster_indices(&txs(&[10.8, 12.0, 10.0, 10.4]));

        assert_eq!(forward, vec![vec![0, 1, 2], vec![3]]);
        assert_eq!(shuffled, vec![vec![2, 3, 0], vec![1]]);
    }

    #[test]
    fn test_proximity_partitions_input() {
        let prices: Vec<f64> = (0..200).map(|i| 50.0 + ((i * 37) % 101) as f64 * 0.13).collect();
        let prints = txs(&prices);

        for strategy in [ProximityStrategy::Greedy, ProximityStrategy::SortedMerge] {
            let detector = TransactionClusterDetector::default().with_strategy(strategy);
            let mut seen: Vec<usize> = detector.cluster_indices(&prints).into_iter().flatten().collect();
            seen.sort_unstable();
            assert_eq!(seen, (0..prints.len()).collect::<Vec<_>>(), "{strategy:?}");
        }
    }

    #[test]
    fn test_non_finite_prices_ignored() {
        let mut prints = txs(&[5.0; 5]);
        prints.push(tx(f64::NAN));

        let detector = TransactionClusterDetector::default();
        assert_eq!(detector.exact_levels(&prints).unwrap()[0].transaction_count, 5);
        assert_eq!(detector.proximity_levels(&prints).unwrap()[0].transaction_count, 5);
    }

    #[test]
    fn test_empty_input() {
        let detector = TransactionClusterDetector::default();
        assert!(detector.exact_levels(&[]).unwrap().is_empty());
        assert!(detector.proximity_levels(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_params_rejected() {
        let detector = TransactionClusterDetector::default().with_threshold(0);
        assert!(matches!(detector.exact_levels(&txs(&[1.0])), Err(AnalyticsError::InvalidParameter(_))));

        let detector = TransactionClusterDetector::default().with_radius(f64::NAN);
        assert!(detector.proximity_levels(&txs(&[1.0])).is_err());
    }
}
