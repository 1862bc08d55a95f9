// src/report/html.rs
// =============================================================================
// Renders the self-contained HTML report.
//
// Layout:
// - run metadata (site, limits, seed, ...)
// - one summary card per variant
// - a table with one row per sampled URL and, per variant, a status badge
//   for every pass plus HTTP code, time and server/CDN of the final pass
//
// Every piece of text that came from the network or the command line goes
// through html-escape.
// =============================================================================

use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write;

use super::summary::{group_results, AuditSummary};
use crate::classify::is_expected_nocache;
use crate::config::{NoCacheMode, RunConfig};
use crate::probe::ProbeResult;

const STYLE: &str = r#"    body{font-family:system-ui,-apple-system,Segoe UI,Roboto,Arial,sans-serif;margin:0;padding:20px;color:#222;background:#f6f7f9;}
    .container{max-width:1200px;margin:0 auto;background:#fff;padding:18px;border-radius:10px;box-shadow:0 2px 10px rgba(0,0,0,.08);}
    h1{margin:0 0 6px;font-size:20px;}
    .meta{background:#f8f9fb;border:1px solid #e7e9ef;padding:12px;border-radius:8px;margin:12px 0;}
    .meta code{background:#fff;border:1px solid #e7e9ef;padding:2px 6px;border-radius:6px;}
    .summary{display:flex;gap:14px;flex-wrap:wrap;margin:14px 0;}
    .card{flex:1;min-width:260px;border:1px solid #e7e9ef;border-radius:10px;padding:12px;background:#fff;}
    .card h2{margin:0 0 8px;font-size:14px;color:#2c3e50;text-transform:uppercase;letter-spacing:.3px;}
    .badge{display:inline-block;padding:3px 8px;border-radius:999px;font-weight:600;font-size:12px;border:1px solid transparent;}
    .hit{background:#e6f7ea;color:#187a2f;border-color:#bfe8c7;}
    .miss{background:#e9f2ff;color:#1450a3;border-color:#c9dcff;}
    .bypass{background:#fff3e0;color:#e65100;border-color:#ffe0b2;}
    .na{background:#f2f2f2;color:#616161;border-color:#e0e0e0;}
    .error{background:#ffebee;color:#c62828;border-color:#ffcdd2;}
    .warn{color:#e65100;}
    table{width:100%;border-collapse:collapse;margin-top:12px;font-size:13px;}
    th,td{padding:10px 10px;border-bottom:1px solid #e7e9ef;text-align:left;vertical-align:top;}
    th{background:#fafbfc;font-size:12px;color:#2c3e50;text-transform:uppercase;letter-spacing:.3px;}
    tr:hover{background:#fafbff;}
    .url{max-width:520px;word-break:break-all;}
    .small{color:#6b7280;font-size:12px;}
"#;

/// Renders the full report page. `generated_at` is printed in the footer.
pub fn render_html(
    config: &RunConfig,
    sample: &[String],
    results: &[ProbeResult],
    summary: &AuditSummary,
    generated_at: &str,
) -> String {
    let mut html = String::new();
    let title = format!("Cache Probe - {}", config.site);

    html.push_str("<!doctype html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("  <meta charset=\"utf-8\"/>\n");
    html.push_str("  <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\"/>\n");
    let _ = writeln!(html, "  <title>{}</title>", encode_text(&title));
    let _ = write!(html, "  <style>\n{}  </style>\n", STYLE);
    html.push_str("</head>\n<body>\n<div class=\"container\">\n");
    let _ = writeln!(html, "  <h1>{}</h1>", encode_text(&title));

    render_meta(&mut html, config);
    render_cards(&mut html, summary, config.expect_nocache);
    render_table(&mut html, config, sample, results, summary);

    let _ = writeln!(
        html,
        "  <div class=\"small\" style=\"margin-top:12px;\">Generated: {}</div>",
        encode_text(generated_at)
    );
    html.push_str("</div>\n</body>\n</html>\n");

    html
}

fn render_meta(html: &mut String, config: &RunConfig) {
    html.push_str("  <div class=\"meta\">\n");
    let _ = writeln!(
        html,
        "    <div><strong>Site:</strong> <code>{}</code></div>",
        encode_text(&config.site)
    );
    let _ = writeln!(
        html,
        "    <div><strong>Limit:</strong> <code>{}</code> | <strong>Variant:</strong> <code>{}</code> | <strong>Method:</strong> <code>{}</code> | <strong>Passes:</strong> <code>{}</code></div>",
        config.limit,
        config.variant.name(),
        config.method.as_str().to_lowercase(),
        config.passes
    );
    let _ = writeln!(
        html,
        "    <div><strong>Concurrency:</strong> <code>{}</code> | <strong>Delay:</strong> <code>{}ms</code> | <strong>Seed:</strong> <code>{}</code></div>",
        config.concurrency,
        config.delay_ms,
        encode_text(&config.seed)
    );
    let _ = writeln!(
        html,
        "    <div><strong>Expect no-cache:</strong> <code>{}</code></div>",
        config.expect_nocache.name()
    );
    html.push_str("  </div>\n");
}

fn render_cards(html: &mut String, summary: &AuditSummary, mode: NoCacheMode) {
    html.push_str("  <div class=\"summary\">\n");

    for (variant, s) in &summary.variants {
        html.push_str("    <div class=\"card\">\n");
        let _ = writeln!(html, "      <h2>{}</h2>", variant.name().to_uppercase());
        let _ = writeln!(html, "      <div><span class=\"badge hit\">hit</span> {}</div>", s.hit);
        let _ = writeln!(html, "      <div><span class=\"badge miss\">miss</span> {}</div>", s.miss);
        let _ = writeln!(html, "      <div><span class=\"badge bypass\">bypass</span> {}</div>", s.bypass);
        let _ = writeln!(html, "      <div><span class=\"badge na\">n/a</span> {}</div>", s.na);
        if s.error > 0 {
            let _ = writeln!(html, "      <div><span class=\"badge error\">error</span> {}</div>", s.error);
        }
        if s.origin_unverifiable > 0 {
            let _ = writeln!(
                html,
                "      <div class=\"small warn\">⚠ CF-HIT (origin unverifiable): {}</div>",
                s.origin_unverifiable
            );
        }
        let _ = writeln!(
            html,
            "      <div class=\"small\" style=\"margin-top:8px;\">Public URLs checked: {}, public problems: {}</div>",
            s.public_total, s.public_problem
        );
        if mode != NoCacheMode::Disabled {
            let _ = writeln!(
                html,
                "      <div class=\"small\">Expected no-cache URLs checked: {}, errors: {}</div>",
                s.expected_total, s.expected_problem
            );
        }
        html.push_str("    </div>\n");
    }

    html.push_str("  </div>\n");
}

fn render_table(
    html: &mut String,
    config: &RunConfig,
    sample: &[String],
    results: &[ProbeResult],
    summary: &AuditSummary,
) {
    let passes = summary.passes;
    let grouped = group_results(results);

    html.push_str("  <table>\n    <thead>\n      <tr>\n");
    html.push_str("        <th>#</th>\n        <th>URL</th>\n        <th>Expected no-cache</th>\n");
    for variant in summary.variants.keys() {
        let name = variant.name().to_uppercase();
        for pass in 1..=passes {
            let label = if passes > 1 { format!(" P{}", pass) } else { String::new() };
            let _ = writeln!(html, "        <th>{}{} status</th>", name, label);
        }
        let _ = writeln!(html, "        <th>{} HTTP</th>", name);
        let _ = writeln!(html, "        <th>{} time</th>", name);
        let _ = writeln!(html, "        <th>{} server/cf</th>", name);
    }
    html.push_str("      </tr>\n    </thead>\n    <tbody>\n");

    for (idx, url) in sample.iter().enumerate() {
        let expected = is_expected_nocache(url, config.expect_nocache);
        html.push_str("      <tr>\n");
        let _ = writeln!(html, "        <td>{}</td>", idx + 1);
        let _ = writeln!(html, "        <td class=\"url\">{}</td>", encode_text(url));
        let _ = writeln!(html, "        <td>{}</td>", if expected { "yes" } else { "no" });

        for variant in summary.variants.keys() {
            let Some(by_pass) = grouped.get(url.as_str()).and_then(|v| v.get(variant)) else {
                let _ = writeln!(
                    html,
                    "        <td colspan=\"{}\"><span class=\"badge na\">n/a</span></td>",
                    passes + 3
                );
                continue;
            };

            for pass in 1..=passes {
                match by_pass.get(&pass) {
                    Some(result) => render_badge(html, result),
                    None => html.push_str("        <td><span class=\"badge na\">-</span></td>\n"),
                }
            }

            match by_pass.get(&passes).filter(|r| !r.is_error()) {
                Some(last) => {
                    let _ = writeln!(html, "        <td>{}</td>", last.http_status.unwrap_or(0));
                    let _ = writeln!(html, "        <td>{}ms</td>", last.elapsed_ms);
                    let server = last.server.as_deref().unwrap_or("");
                    let server_cf = match last.cf_cache_status.as_deref() {
                        Some(cf) => format!("{} / {}", server, cf),
                        None => server.to_string(),
                    };
                    let _ = writeln!(
                        html,
                        "        <td class=\"small\">{}</td>",
                        encode_text(server_cf.trim())
                    );
                }
                None => html.push_str("        <td>-</td><td>-</td><td>-</td>\n"),
            }
        }

        html.push_str("      </tr>\n");
    }

    html.push_str("    </tbody>\n  </table>\n");
}

// One pass's status cell; the tooltip lists the auxiliary cache headers
fn render_badge(html: &mut String, result: &ProbeResult) {
    if let Some(error) = &result.error {
        let _ = writeln!(
            html,
            "        <td><span class=\"badge error\" title=\"{}\">error</span></td>",
            encode_double_quoted_attribute(error)
        );
        return;
    }

    let mut tooltip = Vec::new();
    if result.origin_unverifiable {
        tooltip.push("CF-HIT: origin unverifiable".to_string());
    }
    let extras = [
        ("x-litespeed-cache-control", &result.x_litespeed_cache_control),
        ("cache-control", &result.cache_control),
        ("vary", &result.vary),
        ("age", &result.age),
    ];
    for (name, value) in extras {
        if let Some(value) = value {
            tooltip.push(format!("{}: {}", name, value));
        }
    }

    let mut text = result.cache_status.clone();
    if result.origin_unverifiable {
        text.push_str(" ⚠");
    }

    let _ = writeln!(
        html,
        "        <td><span class=\"badge {}\" title=\"{}\">{}</span></td>",
        result.cache_class.as_str(),
        encode_double_quoted_attribute(&tooltip.join(" | ")),
        encode_text(&text)
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{test_config, Variant, VariantSelection};
    use crate::fetch::{FetchError, FetchResponse};
    use crate::probe::ProbeTask;
    use crate::report::summarize;

    fn result(url: &str, pass: u32, headers: &str) -> ProbeResult {
        let task = ProbeTask {
            id: 0,
            url: url.to_string(),
            variant: Variant::Desktop,
            pass,
        };
        let response = FetchResponse {
            status: 200,
            effective_url: url.to_string(),
            headers: headers.to_string(),
            body: String::new(),
        };
        ProbeResult::from_response(&task, 42, &response)
    }

    #[test]
    fn test_report_contains_badges_and_escapes_text() {
        let mut config = test_config("https://example.com");
        config.variant = VariantSelection::Desktop;
        let url = "https://example.com/?q=<script>".to_string();

        let results = vec![
            result(&url, 1, "x-litespeed-cache: miss\r\n"),
            result(&url, 2, "x-litespeed-cache: hit\r\nserver: LiteSpeed\r\ncf-cache-status: DYNAMIC\r\n"),
        ];
        let sample = vec![url];
        let summary = summarize(&results, &sample, 2, config.expect_nocache);

        let html = render_html(&config, &sample, &results, &summary, "2024-01-01 12:00:00");

        assert!(html.contains("<title>Cache Probe - https://example.com</title>"));
        assert!(html.contains("<th>DESKTOP P1 status</th>"));
        assert!(html.contains("<span class=\"badge miss\""));
        assert!(html.contains("<span class=\"badge hit\""));
        assert!(html.contains("LiteSpeed / DYNAMIC"));
        assert!(html.contains("42ms"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Generated: 2024-01-01 12:00:00"));
    }

    #[test]
    fn test_error_badge_carries_message() {
        let config = test_config("https://example.com");
        let url = "https://example.com/".to_string();
        let task = ProbeTask {
            id: 0,
            url: url.clone(),
            variant: Variant::Desktop,
            pass: 1,
        };
        let results = vec![ProbeResult::from_error(&task, 5, FetchError::Timeout)];
        let sample = vec![url];
        let summary = summarize(&results, &sample, 1, config.expect_nocache);

        let html = render_html(&config, &sample, &results, &summary, "now");

        assert!(html.contains("title=\"request timed out\">error</span>"));
        assert!(html.contains("<td>-</td><td>-</td><td>-</td>"));
    }
}
