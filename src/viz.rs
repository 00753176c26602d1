//! Confusion matrix visualization
//!
//! Renders a [`ConfusionMatrix`] as a self-contained SVG heatmap. The
//! rendering is a non-essential artifact: the pipeline logs it on a
//! best-effort basis and a failure here never aborts a run.

use crate::error::{Error, Result};
use crate::eval::ConfusionMatrix;

const CELL_SIZE: u32 = 64;
const MARGIN: u32 = 80;
const FONT: &str = "font-family=\"monospace\" font-size=\"13\"";

/// Render a confusion matrix as an SVG heatmap string.
///
/// Rows are true classes, columns predicted classes. Cell shade scales with
/// count relative to the largest cell. `labels` must cover every class index
/// in the matrix.
pub fn confusion_matrix_svg(matrix: &ConfusionMatrix, labels: &[String]) -> Result<String> {
    let n = matrix.n_classes();
    if n == 0 {
        return Err(Error::ArtifactGeneration(
            "confusion matrix has no classes".to_string(),
        ));
    }
    if labels.len() < n {
        return Err(Error::ArtifactGeneration(format!(
            "{} class labels provided for {n} classes",
            labels.len()
        )));
    }

    let max_count = (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| matrix.get(i, j))
        .max()
        .unwrap_or(0);

    let side = MARGIN + n as u32 * CELL_SIZE + MARGIN / 2;
    let mut svg = String::with_capacity(1024 + n * n * 160);
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{side}\" height=\"{side}\" \
         viewBox=\"0 0 {side} {side}\">\n"
    ));
    svg.push_str("  <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");

    for (i, label) in labels.iter().take(n).enumerate() {
        let y = MARGIN + i as u32 * CELL_SIZE + CELL_SIZE / 2;
        svg.push_str(&format!(
            "  <text x=\"{x}\" y=\"{y}\" {FONT} text-anchor=\"end\" \
             dominant-baseline=\"middle\">{label}</text>\n",
            x = MARGIN - 8,
            label = escape(label),
        ));
        let x = MARGIN + i as u32 * CELL_SIZE + CELL_SIZE / 2;
        svg.push_str(&format!(
            "  <text x=\"{x}\" y=\"{y}\" {FONT} text-anchor=\"middle\">{label}</text>\n",
            y = MARGIN - 8,
            label = escape(label),
        ));
    }

    for i in 0..n {
        for j in 0..n {
            let count = matrix.get(i, j);
            let intensity = if max_count == 0 {
                0.0
            } else {
                count as f64 / max_count as f64
            };
            // Darker blue for larger counts; text flips to white past half.
            let shade = (255.0 - intensity * 180.0) as u8;
            let text_fill = if intensity > 0.5 { "white" } else { "black" };
            let x = MARGIN + j as u32 * CELL_SIZE;
            let y = MARGIN + i as u32 * CELL_SIZE;
            svg.push_str(&format!(
                "  <rect x=\"{x}\" y=\"{y}\" width=\"{CELL_SIZE}\" height=\"{CELL_SIZE}\" \
                 fill=\"rgb({shade},{shade},255)\" stroke=\"gray\"/>\n"
            ));
            svg.push_str(&format!(
                "  <text x=\"{cx}\" y=\"{cy}\" {FONT} fill=\"{text_fill}\" \
                 text-anchor=\"middle\" dominant-baseline=\"middle\">{count}</text>\n",
                cx = x + CELL_SIZE / 2,
                cy = y + CELL_SIZE / 2,
            ));
        }
    }

    svg.push_str("</svg>\n");
    Ok(svg)
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_class_matrix() -> ConfusionMatrix {
        // 3 true positives per class, one confusion each way.
        let y_true = vec![0, 0, 0, 1, 1, 1, 0, 1];
        let y_pred = vec![0, 0, 0, 1, 1, 1, 1, 0];
        ConfusionMatrix::from_predictions(&y_pred, &y_true, 2).expect("valid")
    }

    #[test]
    fn test_svg_contains_counts_and_labels() {
        let labels = vec!["negative".to_string(), "positive".to_string()];
        let svg = confusion_matrix_svg(&two_class_matrix(), &labels).expect("render");

        assert!(svg.starts_with("<svg"));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert!(svg.contains(">negative</text>"));
        assert!(svg.contains(">positive</text>"));
        assert!(svg.contains(">3</text>"));
        assert!(svg.contains(">1</text>"));
    }

    #[test]
    fn test_svg_cell_count_matches_classes() {
        let labels = vec!["a".to_string(), "b".to_string()];
        let svg = confusion_matrix_svg(&two_class_matrix(), &labels).expect("render");
        // One background rect plus 2x2 cells.
        assert_eq!(svg.matches("<rect").count(), 5);
    }

    #[test]
    fn test_missing_labels_rejected() {
        let labels = vec!["only-one".to_string()];
        let err = confusion_matrix_svg(&two_class_matrix(), &labels).unwrap_err();
        assert!(matches!(err, Error::ArtifactGeneration(_)));
    }

    #[test]
    fn test_labels_are_escaped() {
        let y = vec![0, 1];
        let matrix = ConfusionMatrix::from_predictions(&y, &y, 2).expect("valid");
        let labels = vec!["a<b".to_string(), "c&d".to_string()];
        let svg = confusion_matrix_svg(&matrix, &labels).expect("render");
        assert!(svg.contains("a&lt;b"));
        assert!(svg.contains("c&amp;d"));
    }
}
