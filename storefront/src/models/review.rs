// storefront/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A 1 to 5 star rating of a product with a short text.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub author_id: Uuid,
  pub rating: i32,
  pub description: String,
  pub created_at: DateTime<Utc>,
}

impl Review {
  pub fn new(product_id: Uuid, author_id: Uuid, rating: i32, description: &str) -> Self {
    Self {
      id: Uuid::new_v4(),
      product_id,
      author_id,
      rating,
      description: description.to_string(),
      created_at: Utc::now(),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewSummary {
  pub total_reviews: usize,
  /// Mean rating; `None` until the first review.
  pub rating: Option<f64>,
}

impl ReviewSummary {
  pub fn of(reviews: &[Review]) -> Self {
    let total_reviews = reviews.len();
    let rating = (total_reviews > 0)
      .then(|| reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / total_reviews as f64);
    Self { total_reviews, rating }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn summary_averages_ratings() {
    let product_id = Uuid::new_v4();
    let reviews: Vec<Review> = [5, 4, 2]
      .into_iter()
      .map(|rating| Review::new(product_id, Uuid::new_v4(), rating, "ok"))
      .collect();
    let summary = ReviewSummary::of(&reviews);
    assert_eq!(summary.total_reviews, 3);
    assert_eq!(summary.rating, Some(11.0 / 3.0));

    assert_eq!(ReviewSummary::of(&[]), ReviewSummary { total_reviews: 0, rating: None });
  }
}
