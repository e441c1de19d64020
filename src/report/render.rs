//! Markdown and HTML renderings of a scan report.

use super::ScanReport;
use std::fmt::Write;

pub(super) fn markdown(report: &ScanReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Scan report for {}\n", report.target);
    let _ = writeln!(out, "Timestamp: {}\n", report.timestamp);

    out.push_str("## Open ports\n");
    for port in &report.open_ports {
        let _ = writeln!(out, "- {}", port);
    }

    out.push_str("\n## Banners\n");
    for (port, banner) in &report.banners {
        let _ = writeln!(out, "### Port {}\n```\n{}\n```", port, banner);
    }

    out.push_str("\n## CVE Hints & Explanations\n");
    for (port, text) in &report.explanations {
        let _ = writeln!(out, "### Port {}\n{}\n", port, text);
    }
    out
}

pub(super) fn html(report: &ScanReport) -> String {
    let target = escape(&report.target);
    let mut out = String::new();
    let _ = write!(
        out,
        "<html><head><meta charset='utf-8'><title>Scan report {target}</title></head><body>"
    );
    let _ = write!(out, "<h1>Scan report for {target}</h1>");
    let _ = write!(out, "<p>Timestamp: {}</p>", escape(&report.timestamp));

    out.push_str("<h2>Open ports</h2><ul>");
    for port in &report.open_ports {
        let _ = write!(out, "<li>{}</li>", port);
    }
    out.push_str("</ul>");

    out.push_str("<h2>Banners</h2>");
    for (port, banner) in &report.banners {
        let _ = write!(out, "<h3>Port {}</h3><pre>{}</pre>", port, escape(banner));
    }

    out.push_str("<h2>CVE Hints &amp; Explanations</h2>");
    for (port, text) in &report.explanations {
        let _ = write!(out, "<h3>Port {}</h3><pre>{}</pre>", port, escape(text));
    }
    out.push_str("</body></html>");
    out
}

/// Banners are attacker-controlled text.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banner::BannerMap;
    use crate::summary::Explanations;
    use crate::vuln::CveMap;

    fn report() -> ScanReport {
        let mut banners = BannerMap::new();
        banners.insert(80, "<script>alert(1)</script>".to_string());
        let mut explanations = Explanations::new();
        explanations.insert(80, "- CVE-1: bad".to_string());
        ScanReport::new("host", vec![80], banners, CveMap::new(), explanations)
    }

    #[test]
    fn test_markdown_sections() {
        let md = markdown(&report());
        assert!(md.contains("## Open ports\n- 80\n"));
        assert!(md.contains("### Port 80\n```\n<script>alert(1)</script>\n```"));
        assert!(md.contains("### Port 80\n- CVE-1: bad\n"));
    }

    #[test]
    fn test_html_escapes_banners() {
        let page = html(&report());
        assert!(page.contains("<li>80</li>"));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
        assert!(page.ends_with("</body></html>"));
    }
}
