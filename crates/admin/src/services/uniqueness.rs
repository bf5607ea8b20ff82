//! Debounced uniqueness checks for slugs and coupon codes.
//!
//! Duplicates are business-rule failures, so they come back as field errors
//! next to the local shape errors rather than as request failures.

use std::time::Duration;

use tracing::{debug, instrument};

use vitrine_core::CouponId;

use super::debounce::{Debounced, Debouncer};
use crate::api::{ApiError, CommerceApi, SlugCheck};
use crate::checkout::FieldErrors;

const MAX_SLUG_CHARS: usize = 96;

/// Local shape rule for slugs: lowercase ASCII letters, digits and single
/// hyphens, not starting or ending with a hyphen.
///
/// # Errors
///
/// Returns the message to show on the field.
pub fn validate_slug(slug: &str) -> Result<(), &'static str> {
    if slug.is_empty() {
        return Err("required");
    }
    if slug.len() > MAX_SLUG_CHARS {
        return Err("slug is too long");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err("use lowercase letters, digits and hyphens");
    }
    if slug.starts_with('-') || slug.ends_with('-') || slug.contains("--") {
        return Err("hyphens must separate words");
    }
    Ok(())
}

/// Turn a product name into a slug candidate.
///
/// Accented Latin letters are folded to ASCII; everything else that is not
/// alphanumeric becomes a single hyphen.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c);
        if c.is_ascii_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

const fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

/// Debounced remote uniqueness checker for one input field.
#[derive(Debug, Clone)]
pub struct UniquenessChecker<A> {
    api: A,
    debouncer: Debouncer,
}

impl<A: CommerceApi> UniquenessChecker<A> {
    #[must_use]
    pub fn new(api: A, delay: Duration) -> Self {
        Self {
            api,
            debouncer: Debouncer::new(delay),
        }
    }

    /// Check a product slug. Shape errors are returned without a request.
    ///
    /// # Errors
    ///
    /// Returns error if the remote check fails.
    pub async fn product_slug(&self, slug: &str) -> Result<Debounced<FieldErrors>, ApiError> {
        if let Err(message) = validate_slug(slug) {
            self.debouncer.supersede();
            return Ok(Debounced::Ready(single("slug", message)));
        }
        self.check("slug", SlugCheck::product_slug(slug)).await
    }

    /// Check a coupon code, ignoring the coupon being edited.
    ///
    /// # Errors
    ///
    /// Returns error if the remote check fails.
    pub async fn coupon_code(
        &self,
        code: &str,
        editing: Option<&CouponId>,
    ) -> Result<Debounced<FieldErrors>, ApiError> {
        if let Err(message) = crate::coupons::validate_code(code) {
            self.debouncer.supersede();
            return Ok(Debounced::Ready(single("code", message)));
        }
        self.check("code", SlugCheck::coupon_code(code, editing))
            .await
    }

    /// Run `check` after the debounce window; a taken value becomes an error
    /// on `field`.
    ///
    /// # Errors
    ///
    /// Returns error if the remote check fails.
    #[instrument(skip(self, check), fields(collection = %check.collection, value = %check.value))]
    pub async fn check(
        &self,
        field: &str,
        check: SlugCheck,
    ) -> Result<Debounced<FieldErrors>, ApiError> {
        let outcome = self
            .debouncer
            .run(|| async { self.api.slug_available(&check).await })
            .await;

        match outcome {
            Debounced::Superseded => {
                debug!("Uniqueness check superseded");
                Ok(Debounced::Superseded)
            }
            Debounced::Ready(Ok(true)) => Ok(Debounced::Ready(FieldErrors::new())),
            Debounced::Ready(Ok(false)) => Ok(Debounced::Ready(single(field, "already in use"))),
            Debounced::Ready(Err(e)) => Err(e),
        }
    }
}

fn single(field: &str, message: &str) -> FieldErrors {
    let mut errors = FieldErrors::new();
    errors.insert(field, message);
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakeApi};

    const DELAY: Duration = Duration::from_millis(500);

    #[test]
    fn test_validate_slug() {
        assert!(validate_slug("camiseta-azul-2").is_ok());
        assert!(validate_slug("").is_err());
        assert!(validate_slug("Camiseta").is_err());
        assert!(validate_slug("-azul").is_err());
        assert!(validate_slug("azul--claro").is_err());
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Camiseta Básica  Azul!"), "camiseta-basica-azul");
        assert_eq!(slugify("  Ação & Reação "), "acao-reacao");
        assert_eq!(slugify("!!!"), "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_taken_slug_is_a_field_error() {
        let api = FakeApi {
            taken_slugs: vec!["camiseta".to_string()],
            ..FakeApi::default()
        };
        let checker = UniquenessChecker::new(api, DELAY);

        let errors = checker.product_slug("camiseta").await.unwrap().ready().unwrap();
        assert_eq!(errors.get("slug"), Some("already in use"));

        let errors = checker.product_slug("camiseta-2").await.unwrap().ready().unwrap();
        assert!(errors.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_shape_skips_request() {
        let api = FakeApi::default();
        let checker = UniquenessChecker::new(api.clone(), DELAY);

        let errors = checker.product_slug("Not A Slug").await.unwrap().ready().unwrap();
        assert!(errors.contains("slug"));
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_typing_sends_one_request() {
        let api = FakeApi::default();
        let checker = UniquenessChecker::new(api.clone(), DELAY);

        let early = {
            let checker = checker.clone();
            tokio::spawn(async move { checker.product_slug("cami").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = checker.product_slug("camiseta").await.unwrap();

        assert!(early.await.unwrap().unwrap().is_superseded());
        assert!(latest.ready().unwrap().is_empty());
        assert_eq!(
            api.calls(),
            vec![Call::SlugAvailable(SlugCheck::product_slug("camiseta"))]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_edit_supersedes_pending_check() {
        let api = FakeApi {
            taken_slugs: vec!["camiseta".to_string()],
            ..FakeApi::default()
        };
        let checker = UniquenessChecker::new(api.clone(), DELAY);

        let early = {
            let checker = checker.clone();
            tokio::spawn(async move { checker.product_slug("camiseta").await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = checker.product_slug("Camiseta!").await.unwrap();

        assert_eq!(
            latest.ready().unwrap().get("slug"),
            Some("use lowercase letters, digits and hyphens")
        );
        assert!(early.await.unwrap().unwrap().is_superseded());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_coupon_code_supersedes_pending_check() {
        let api = FakeApi::default();
        let checker = UniquenessChecker::new(api.clone(), DELAY);

        let early = {
            let checker = checker.clone();
            tokio::spawn(async move { checker.coupon_code("VIP10", None).await })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;
        let latest = checker.coupon_code("x", None).await.unwrap();

        assert!(latest.ready().unwrap().contains("code"));
        assert!(early.await.unwrap().unwrap().is_superseded());
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_coupon_code_excludes_edited_coupon() {
        let api = FakeApi::default();
        let checker = UniquenessChecker::new(api.clone(), DELAY);
        let id = CouponId::new("cp_1");

        checker.coupon_code("BLACK-FRIDAY", Some(&id)).await.unwrap();

        let calls = api.calls();
        let Some(Call::SlugAvailable(check)) = calls.first() else {
            panic!("expected a slug check");
        };
        assert_eq!(check.collection, "coupons");
        assert_eq!(check.exclude_id.as_deref(), Some("cp_1"));
    }
}
