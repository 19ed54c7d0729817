use anyhow::{bail, Result};

/// Highest number in the 6/45 game.
pub const POOL_SIZE: u8 = 45;
/// Main numbers per draw and per ticket.
pub const PICK_COUNT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draw {
    pub round: u32,
    pub date: String,
    pub numbers: [u8; PICK_COUNT],
    pub bonus: u8,
}

impl Draw {
    pub fn sorted_numbers(&self) -> [u8; PICK_COUNT] {
        let mut numbers = self.numbers;
        numbers.sort();
        numbers
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberStats {
    pub number: u8,
    pub frequency: u32,
    /// Draws since the number last appeared, counted from the most recent one.
    pub gap: u32,
}

pub fn is_valid_number(n: u8) -> bool {
    (1..=POOL_SIZE).contains(&n)
}

pub fn validate_draw(numbers: &[u8; PICK_COUNT], bonus: u8) -> Result<()> {
    for &n in numbers {
        if !is_valid_number(n) {
            bail!("Number {} out of range (1-{})", n, POOL_SIZE);
        }
    }
    if !is_valid_number(bonus) {
        bail!("Bonus {} out of range (1-{})", bonus, POOL_SIZE);
    }
    for i in 0..numbers.len() {
        for j in (i + 1)..numbers.len() {
            if numbers[i] == numbers[j] {
                bail!("Duplicate number: {}", numbers[i]);
            }
        }
    }
    if numbers.contains(&bonus) {
        bail!("Bonus {} is already one of the main numbers", bonus);
    }
    Ok(())
}
