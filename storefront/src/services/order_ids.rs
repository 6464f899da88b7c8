// storefront/src/services/order_ids.rs

use rand::Rng;

const ORDER_ID_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Produces candidate order ids. The store checks each candidate against
/// existing orders and asks again on collision.
pub trait OrderIdSource: Send + Sync {
  fn next_id(&self) -> String;
}

/// Random uppercase alphanumeric ids of a fixed length.
#[derive(Debug, Clone)]
pub struct RandomOrderIds {
  length: usize,
}

impl RandomOrderIds {
  pub fn new(length: usize) -> Self {
    Self { length }
  }
}

impl OrderIdSource for RandomOrderIds {
  fn next_id(&self) -> String {
    let mut rng = rand::thread_rng();
    (0..self.length)
      .map(|_| ORDER_ID_CHARSET[rng.gen_range(0..ORDER_ID_CHARSET.len())] as char)
      .collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ids_have_requested_length_and_charset() {
    let ids = RandomOrderIds::new(10);
    for _ in 0..50 {
      let id = ids.next_id();
      assert_eq!(id.len(), 10);
      assert!(id.bytes().all(|b| ORDER_ID_CHARSET.contains(&b)));
    }
  }
}
