use crate::types::{Label, PredictionResult, Segment};
use std::fmt::Write;

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Phishing URL Detector</title>
</head>
<body>
<h1>Phishing URL Detector</h1>
"#;

const TAIL: &str = "</body>\n</html>\n";

pub fn index_page(url: Option<&str>, result: Option<&PredictionResult>) -> String {
    let mut page = String::from(HEAD);
    let _ = write!(
        page,
        "<form method=\"post\" action=\"/\">\n\
         <input type=\"text\" name=\"url\" placeholder=\"https://example.com\" value=\"{}\" size=\"80\">\n\
         <button type=\"submit\">Check</button>\n\
         </form>\n",
        escape(url.unwrap_or(""))
    );
    if let Some(result) = result {
        page.push_str(&result_section(result));
    }
    page.push_str(TAIL);
    page
}

pub fn error_page(message: &str) -> String {
    format!("{}<p class=\"error\">{}</p>\n<p><a href=\"/\">Back</a></p>\n{}", HEAD, escape(message), TAIL)
}

fn result_section(result: &PredictionResult) -> String {
    let verdict = match result.label {
        Label::Phishing => "Phishing Website",
        Label::Legitimate => "Legitimate Website",
    };

    let mut out = String::from("<section class=\"result\">\n");
    let _ = writeln!(out, "<h2 class=\"{}\">{}</h2>", result.label.as_str(), verdict);
    let _ = writeln!(out, "<p>Confidence: {:.2}%</p>", result.confidence);
    let _ = writeln!(out, "<p>Risk level: {}</p>", result.risk_tier.as_str());

    if let Some(advisory) = &result.advisory {
        let _ = writeln!(out, "<p class=\"advisory\">{}</p>", escape(advisory));
    }

    if !result.reasons.is_empty() {
        out.push_str("<ul class=\"reasons\">\n");
        for reason in &result.reasons {
            let _ = writeln!(out, "<li>{}</li>", escape(reason));
        }
        out.push_str("</ul>\n");
    }

    if !result.highlighted.is_empty() {
        let _ = writeln!(out, "<p class=\"url\"><code>{}</code></p>", highlighted(&result.highlighted));
    }

    out.push_str("</section>\n");
    out
}

fn highlighted(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| {
            if s.suspicious {
                format!("<mark>{}</mark>", escape(&s.text))
            } else {
                escape(&s.text)
            }
        })
        .collect()
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
