pub mod altman;
pub mod fgpmi;
