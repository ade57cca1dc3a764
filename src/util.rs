use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{MojoError, MojoResult};

pub(crate) fn create_progress_bar(total_steps: u64, msg: &str) -> MojoResult<ProgressBar> {
    let pb = ProgressBar::new(total_steps);

    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "[{spinner:.green} {elapsed_precise}] {bar:40.cyan/blue} {bytes}/{total_bytes} ({percent}%) {msg}",
            )
            .map_err(|e| MojoError::Communication(format!("Failed to create progress bar: {}", e)))?
            .progress_chars("#>-"),
    );
    pb.set_message(msg.to_owned());

    Ok(pb)
}

/// Position on a bar of `total` steps for a completion fraction
pub(crate) fn fraction_to_position(fraction: f64, total: u64) -> u64 {
    (fraction.clamp(0.0, 1.0) * total as f64).round() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_to_position() {
        assert_eq!(fraction_to_position(0.0, 1024), 0);
        assert_eq!(fraction_to_position(0.25, 1024), 256);
        assert_eq!(fraction_to_position(1.0, 1024), 1024);
        assert_eq!(fraction_to_position(1.5, 1024), 1024);
        assert_eq!(fraction_to_position(-0.5, 1024), 0);
    }
}
