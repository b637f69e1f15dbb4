//! LaTeX source generation for formula previews.
//!
//! The formula is dropped between two fixed halves. The second half measures
//! the typeset formula and raises an error when its height is zero, so a blank
//! formula fails the build instead of producing a sizeless PDF that cannot be
//! decoded.

const PREAMBLE: &str = concat!(
    "\\documentclass[crop, border=5pt]{standalone}\n",
    "\\usepackage{amsmath}\n",
    "\\usepackage{ifthen}\n",
    "\\begin{document}\n",
    "\\def\\preview{\\(\\displaystyle\n",
);

const POSTAMBLE: &str = concat!(
    "\n\\)}\n",
    "\\newlength{\\pheight}\n",
    "\\settoheight{\\pheight}{\\hbox{\\preview}}\n",
    "\\ifthenelse{\\pheight=0.0pt}\n",
    "{\\GenericError{}{texpreview: blank formula}{}{}}\n",
    "{\\preview}\n",
    "\\end{document}\n",
);

/// Wrap `formula` into a standalone document.
pub fn render_source(formula: &str) -> String {
    let mut source = String::with_capacity(PREAMBLE.len() + formula.len() + POSTAMBLE.len());
    source.push_str(PREAMBLE);
    source.push_str(formula);
    source.push_str(POSTAMBLE);
    source
}
