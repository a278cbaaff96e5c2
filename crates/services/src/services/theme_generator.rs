//! Seed → design parameters → CSS.

use std::sync::Arc;

use db::models::theme::{DesignParams, Layout};
use serde::Serialize;

use super::{
    theme_catalog::{CatalogError, ThemeCatalog},
    theme_document::google_fonts_href,
    theme_rng::SeededRng,
};

/// `items[floor(draw * len)]`, clamped to the last entry.
pub fn pick<'a, T>(items: &'a [T], rng: &mut SeededRng) -> Option<&'a T> {
    let last = items.len().checked_sub(1)?;
    let index = (rng.next_f64() * items.len() as f64).floor() as usize;
    items.get(index.min(last))
}

/// Draws palette, font pair, density, max width, border radius and card
/// shadow, in that order. Changing the order changes every published theme.
pub fn select_design(
    rng: &mut SeededRng,
    catalog: &ThemeCatalog,
) -> Result<DesignParams, CatalogError> {
    let palette = pick(&catalog.palettes, rng).ok_or(CatalogError::EmptyTable("palettes"))?;
    let fonts = pick(&catalog.font_pairs, rng).ok_or(CatalogError::EmptyTable("font_pairs"))?;
    let density = pick(&catalog.densities, rng).ok_or(CatalogError::EmptyTable("densities"))?;
    let max_width = pick(&catalog.max_widths, rng).ok_or(CatalogError::EmptyTable("max_widths"))?;
    let border_radius =
        pick(&catalog.border_radii, rng).ok_or(CatalogError::EmptyTable("border_radii"))?;
    let card_shadow =
        pick(&catalog.card_shadows, rng).ok_or(CatalogError::EmptyTable("card_shadows"))?;

    Ok(DesignParams {
        palette: palette.clone(),
        fonts: fonts.clone(),
        layout: Layout {
            density: *density,
            max_width: max_width.clone(),
            border_radius: border_radius.clone(),
            card_shadow: card_shadow.clone(),
        },
    })
}

/// Adds `amount` to each RGB channel of a `#rrggbb` colour, clamping to
/// `0..=255`. Input that is not six hex digits is returned unchanged.
pub fn shade(hex: &str, amount: i32) -> String {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return hex.to_string();
    }

    let channel = |i: usize| {
        let base = i32::from_str_radix(&digits[i..i + 2], 16).unwrap_or(0);
        (base + amount).clamp(0, 255)
    };
    format!("#{:02x}{:02x}{:02x}", channel(0), channel(2), channel(4))
}

fn font_stack(family: &str, fallback: &str) -> String {
    if family.trim().is_empty() {
        fallback.to_string()
    } else {
        format!("'{}', {}", family.trim(), fallback)
    }
}

/// Header text must neither close the comment nor the enclosing `<style>`.
fn comment_safe(text: &str) -> String {
    text.replace("*/", "* /").replace('<', "\\3c ")
}

pub fn synthesize_css(post_id: &str, seed: &str, params: &DesignParams) -> String {
    let palette = &params.palette;
    let layout = &params.layout;
    let accent = shade(&palette.primary, -10);
    let muted = shade(&palette.secondary, 40);
    let heading_font = font_stack(&params.fonts.heading, "Georgia, 'Times New Roman', serif");
    let body_font = font_stack(
        &params.fonts.body,
        "system-ui, -apple-system, 'Segoe UI', Roboto, sans-serif",
    );
    let padding = layout.density.padding();

    format!(
        r#"/* random theme: post {post_id}, seed {seed}, density {density} */
:root {{
  --rt-primary: {primary};
  --rt-secondary: {secondary};
  --rt-accent: {accent};
  --rt-muted: {muted};
  --rt-bg: {background};
  --rt-text: {text};
  --rt-max-width: {max_width};
  --rt-radius: {radius};
}}
body {{
  margin: 0;
  background: var(--rt-bg);
  color: var(--rt-text);
  font-family: {body_font};
  line-height: 1.7;
  -webkit-font-smoothing: antialiased;
}}
main, article, .container {{
  max-width: var(--rt-max-width);
  margin: 0 auto;
  padding: {padding};
  box-sizing: border-box;
}}
h1, h2, h3 {{
  font-family: {heading_font};
  color: var(--rt-primary);
  line-height: 1.25;
  margin: 1.6em 0 0.6em;
}}
h1 {{ font-size: 2.4rem; margin-top: 0; }}
h2 {{ font-size: 1.75rem; }}
h3 {{ font-size: 1.3rem; color: var(--rt-accent); }}
a {{
  color: var(--rt-accent);
  text-decoration-thickness: 2px;
  text-underline-offset: 3px;
}}
a:hover {{ color: var(--rt-secondary); }}
img {{
  max-width: 100%;
  height: auto;
  border-radius: var(--rt-radius);
}}
blockquote {{
  margin: 1.5em 0;
  padding: 0.75em 1.25em;
  border-left: 4px solid var(--rt-secondary);
  background: var(--rt-muted);
  border-radius: 0 var(--rt-radius) var(--rt-radius) 0;
}}
code, pre {{
  font-family: ui-monospace, SFMono-Regular, Menlo, Consolas, monospace;
  font-size: 0.92em;
}}
pre {{
  padding: 1em;
  overflow-x: auto;
  background: var(--rt-text);
  color: var(--rt-bg);
  border-radius: var(--rt-radius);
}}
ul, ol {{ padding-left: 1.4em; }}
li {{ margin: 0.35em 0; }}
li::marker {{ color: var(--rt-primary); }}
.card {{
  background: var(--rt-bg);
  border: 1px solid var(--rt-muted);
  border-radius: var(--rt-radius);
  box-shadow: {shadow};
  padding: {padding};
  margin: 1.5em 0;
}}
.hero {{
  padding: {padding};
  border-radius: var(--rt-radius);
  background: linear-gradient(135deg, var(--rt-primary), var(--rt-secondary));
  color: var(--rt-bg);
}}
.hero h1, .hero h2 {{ color: inherit; }}
@media (max-width: 640px) {{
  main, article, .container {{ padding: 1rem; }}
  h1 {{ font-size: 1.9rem; }}
  h2 {{ font-size: 1.45rem; }}
  .card, .hero {{ padding: 1rem; }}
}}
"#,
        post_id = comment_safe(post_id),
        seed = comment_safe(seed),
        density = layout.density,
        primary = palette.primary,
        secondary = palette.secondary,
        background = palette.background,
        text = palette.text,
        max_width = layout.max_width,
        radius = layout.border_radius,
        shadow = layout.card_shadow,
    )
}

/// Rendered theme; built once and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedTheme {
    pub post_id: String,
    pub seed: String,
    pub params: DesignParams,
    pub css: String,
    pub fonts_href: String,
}

#[derive(Debug, Clone)]
pub struct ThemeGenerator {
    catalog: Arc<ThemeCatalog>,
}

impl Default for ThemeGenerator {
    fn default() -> Self {
        Self {
            catalog: Arc::new(ThemeCatalog::builtin().clone()),
        }
    }
}

impl ThemeGenerator {
    pub fn new(catalog: ThemeCatalog) -> Result<Self, CatalogError> {
        catalog.validate()?;
        Ok(Self {
            catalog: Arc::new(catalog),
        })
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    pub fn design_for_seed(&self, seed: &str) -> Result<DesignParams, CatalogError> {
        select_design(&mut SeededRng::new(seed), &self.catalog)
    }

    pub fn generate(&self, post_id: &str, seed: &str) -> Result<GeneratedTheme, CatalogError> {
        let params = self.design_for_seed(seed)?;
        let css = synthesize_css(post_id, seed, &params);
        let fonts_href = google_fonts_href(&params.fonts);

        Ok(GeneratedTheme {
            post_id: post_id.to_string(),
            seed: seed.to_string(),
            params,
            css,
            fonts_href,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use db::models::theme::{Density, FontPair, Palette};

    use super::*;

    #[test]
    fn test_shade_brightens_and_clamps() {
        assert_eq!(shade("#000000", 50), "#323232");
        assert_eq!(shade("#ffffff", 50), "#ffffff");
        assert_eq!(shade("#808080", -300), "#000000");
    }

    #[test]
    fn test_shade_accepts_uppercase_and_missing_hash() {
        assert_eq!(shade("#1A2B3C", 1), "#1b2c3d");
        assert_eq!(shade("102030", -16), "#001020");
    }

    #[test]
    fn test_shade_passes_malformed_colours_through() {
        assert_eq!(shade("#fff", 20), "#fff");
        assert_eq!(shade("#gg0000", 20), "#gg0000");
        assert_eq!(shade("tomato", 20), "tomato");
        assert_eq!(shade("#1a2b3c4d", 20), "#1a2b3c4d");
    }

    #[test]
    fn test_pick_empty_slice() {
        let empty: [u8; 0] = [];
        assert!(pick(&empty, &mut SeededRng::new("x")).is_none());
    }

    #[test]
    fn test_select_design_uses_six_draws() {
        let catalog = ThemeCatalog::builtin();
        let mut rng = SeededRng::new("draw-count");
        select_design(&mut rng, catalog).unwrap();

        let mut expected = SeededRng::new("draw-count");
        for _ in 0..6 {
            expected.next_u32();
        }
        assert_eq!(rng, expected);
    }

    #[test]
    fn test_select_design_follows_draw_order() {
        let catalog = ThemeCatalog::builtin();
        let params = select_design(&mut SeededRng::new("order"), catalog).unwrap();

        let mut rng = SeededRng::new("order");
        let mut index = |len: usize| ((rng.next_f64() * len as f64).floor() as usize).min(len - 1);
        assert_eq!(params.palette, catalog.palettes[index(8)]);
        assert_eq!(params.fonts, catalog.font_pairs[index(8)]);
        assert_eq!(params.layout.density, catalog.densities[index(3)]);
        assert_eq!(params.layout.max_width, catalog.max_widths[index(4)]);
        assert_eq!(params.layout.border_radius, catalog.border_radii[index(4)]);
        assert_eq!(params.layout.card_shadow, catalog.card_shadows[index(3)]);
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = ThemeGenerator::default();
        let a = generator.generate("post-1", "example.com-1700000000000").unwrap();
        let b = generator.generate("post-1", "example.com-1700000000000").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.css, b.css);
    }

    #[test]
    fn test_catalog_coverage_over_many_seeds() {
        let generator = ThemeGenerator::default();
        let catalog = generator.catalog();

        let mut palettes = HashSet::new();
        let mut fonts = HashSet::new();
        let mut densities = HashSet::new();
        let mut widths = HashSet::new();
        let mut radii = HashSet::new();
        let mut shadows = HashSet::new();

        for i in 0..1000 {
            let params = generator.design_for_seed(&format!("seed-{i:04}")).unwrap();
            palettes.insert(params.palette);
            fonts.insert(params.fonts);
            densities.insert(params.layout.density);
            widths.insert(params.layout.max_width);
            radii.insert(params.layout.border_radius);
            shadows.insert(params.layout.card_shadow);
        }

        assert_eq!(palettes.len(), catalog.palettes.len());
        assert_eq!(fonts.len(), catalog.font_pairs.len());
        assert_eq!(densities.len(), catalog.densities.len());
        assert_eq!(widths.len(), catalog.max_widths.len());
        assert_eq!(radii.len(), catalog.border_radii.len());
        assert_eq!(shadows.len(), catalog.card_shadows.len());
    }

    fn fixed_params(density: Density) -> DesignParams {
        DesignParams {
            palette: Palette::new("#000000", "#101010", "#ffffff", "#222222"),
            fonts: FontPair::new("Lora", "Inter"),
            layout: Layout {
                density,
                max_width: "760px".to_string(),
                border_radius: "8px".to_string(),
                card_shadow: "none".to_string(),
            },
        }
    }

    #[test]
    fn test_css_root_block() {
        let css = synthesize_css("p1", "s1", &fixed_params(Density::Balanced));
        assert!(css.starts_with("/* random theme: post p1, seed s1, density balanced */\n:root {"));
        assert!(css.contains("--rt-accent: #000000;"));
        assert!(css.contains("--rt-muted: #383838;"));
        assert!(css.contains("--rt-max-width: 760px;"));
        assert!(css.contains("--rt-radius: 8px;"));
        assert!(css.contains("font-family: 'Lora', Georgia"));
        assert!(css.contains("font-family: 'Inter', system-ui"));
        assert_eq!(css.matches("@media (max-width: 640px)").count(), 1);

        let root = &css[css.find(":root {").unwrap()..];
        let root = &root[..root.find('}').unwrap()];
        assert_eq!(root.matches("--rt-").count(), 8);
    }

    #[test]
    fn test_css_padding_follows_density() {
        let container_padding = |density| {
            let css = synthesize_css("p", "s", &fixed_params(density));
            let rule = &css[css.find("main, article, .container {").unwrap()..];
            rule[..rule.find('}').unwrap()].to_string()
        };
        assert!(container_padding(Density::Airy).contains("padding: 3rem;"));
        assert!(container_padding(Density::Cozy).contains("padding: 1rem;"));
        assert!(container_padding(Density::Balanced).contains("padding: 2rem;"));
    }

    #[test]
    fn test_css_comment_cannot_be_closed_by_seed() {
        let css = synthesize_css("p", "evil */ body{display:none}", &fixed_params(Density::Cozy));
        let header = css.lines().next().unwrap();
        assert_eq!(header.matches("*/").count(), 1);
        assert!(header.ends_with("*/"));
    }

    #[test]
    fn test_css_header_cannot_close_style_element() {
        let css = synthesize_css(
            "</style><b>",
            "</style><script>alert(1)</script><style id=\"rtheme-x\">",
            &fixed_params(Density::Cozy),
        );
        assert!(!css.contains('<'));
        assert!(!css.to_ascii_lowercase().contains("</style"));
        assert!(css.lines().next().unwrap().contains("\\3c /style>"));
    }

    #[test]
    fn test_new_rejects_empty_catalog() {
        let catalog = ThemeCatalog {
            palettes: vec![],
            ..ThemeCatalog::default()
        };
        assert!(ThemeGenerator::new(catalog).is_err());
    }

    #[test]
    fn test_injected_catalog_is_used() {
        let only = Palette::new("#123456", "#654321", "#fafafa", "#050505");
        let generator = ThemeGenerator::new(ThemeCatalog {
            palettes: vec![only.clone()],
            ..ThemeCatalog::default()
        })
        .unwrap();
        for i in 0..20 {
            let params = generator.design_for_seed(&i.to_string()).unwrap();
            assert_eq!(params.palette, only);
        }
    }
}
