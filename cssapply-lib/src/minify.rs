use crate::error::MinifyError;
use lightningcss::error::{Error as LcssError, MinifyErrorKind, ParserError, PrinterErrorKind};
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet as LightningStyleSheet};
use log::debug;

/// Compress expanded CSS with lightningcss.
pub fn minify(css: &str, source_name: Option<&str>) -> Result<String, MinifyError> {
    let parser_opts = ParserOptions {
        filename: source_name.unwrap_or("<input>").to_string(),
        ..ParserOptions::default()
    };

    let mut sheet = LightningStyleSheet::parse(css, parser_opts)
        .map_err(|e: LcssError<ParserError<'_>>| MinifyError::Parse(e.kind.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e: LcssError<MinifyErrorKind>| MinifyError::Transform(e.kind.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e: LcssError<PrinterErrorKind>| MinifyError::Print(e.kind.to_string()))?;
    debug!("minified {} bytes to {}", css.len(), printed.code.len());
    Ok(printed.code)
}
