//! Per-region price distribution (box plot statistics).

use crate::domain::observation::PriceObservation;

#[derive(Debug, Clone, PartialEq)]
pub struct RegionDistribution {
    pub region: String,
    pub count: usize,
    pub min: f64,
    pub lower_quartile: f64,
    pub median: f64,
    pub upper_quartile: f64,
    pub max: f64,
}

/// Linear-interpolated quantile of an ascending slice. `q` in [0, 1].
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Box statistics of `price` per region, regions in first-seen order.
pub fn region_distributions(subset: &[&PriceObservation]) -> Vec<RegionDistribution> {
    let mut order: Vec<&str> = Vec::new();
    let mut prices: Vec<Vec<f64>> = Vec::new();

    for obs in subset {
        match order.iter().position(|r| *r == obs.admin_region) {
            Some(i) => prices[i].push(obs.price),
            None => {
                order.push(&obs.admin_region);
                prices.push(vec![obs.price]);
            }
        }
    }

    order
        .into_iter()
        .zip(prices)
        .filter_map(|(region, mut values)| {
            values.sort_by(f64::total_cmp);
            Some(RegionDistribution {
                region: region.to_string(),
                count: values.len(),
                min: *values.first()?,
                lower_quartile: quantile(&values, 0.25)?,
                median: quantile(&values, 0.5)?,
                upper_quartile: quantile(&values, 0.75)?,
                max: *values.last()?,
            })
        })
        .collect()
}
