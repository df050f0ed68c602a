//! 예측 파일 출력
//!
//! 한 줄에 `이미지이름\t캡션` 형식.

use crate::core::error::Result;
use crate::core::vocab::END;
use chrono::{DateTime, TimeZone};
use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// `{split}_epoch_{epoch}_{tag}_t_{월_일_시_분}.pred`
pub fn prediction_file_name<Tz>(split: &str, epoch: usize, tag: &str, timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!(
        "{}_epoch_{}_{}_t_{}.pred",
        split,
        epoch,
        tag,
        timestamp.format("%m_%d_%H_%M")
    )
}

/// 예측 캡션들을 파일로 쓴다. 마지막 단어가 END 면 떼어낸다.
pub fn write_predictions(path: &Path, predictions: &[(String, Vec<String>)]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for (image, words) in predictions {
        let words = match words.last() {
            Some(last) if last == END => &words[..words.len() - 1],
            _ => &words[..],
        };
        writeln!(writer, "{}\t{}", image, words.join(" "))?;
    }
    writer.flush()?;
    Ok(())
}
