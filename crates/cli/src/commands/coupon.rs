//! Coupon writes from YAML.
//!
//! # Usage
//!
//! ```bash
//! # black-friday.yaml:
//! #   code: BLACK-FRIDAY
//! #   kind: percentage
//! #   percent: 15
//! #   ends_at: 2026-11-30T03:00:00Z
//! vitrine coupon black-friday.yaml
//! vitrine coupon black-friday.yaml --id cpn_123
//! ```

use std::path::Path;

use vitrine_admin::coupons::{CouponError, CouponInput};
use vitrine_admin::{AdminConfig, AppError};
use vitrine_core::CouponId;

use super::{connect, print_line, read_yaml};

/// Validate the coupon at `path` and create it, or update `id` when given.
pub async fn write(
    config: &AdminConfig,
    path: &Path,
    id: Option<&str>,
    dry_run: bool,
) -> Result<(), AppError> {
    let input: CouponInput = read_yaml(path)?;

    if dry_run {
        let errors = input.validate();
        if !errors.is_empty() {
            return Err(CouponError::Invalid(errors).into());
        }
        print_line(&format!("Coupon {} is valid; dry run, nothing written", input.code));
        return Ok(());
    }

    let client = connect(config).await?;
    let coupon = match id {
        Some(id) => client.update_coupon(&CouponId::new(id), &input).await?,
        None => client.create_coupon(&input).await?,
    };

    print_line(&format!("Coupon {} saved as {}", coupon.code, coupon.id));
    Ok(())
}
