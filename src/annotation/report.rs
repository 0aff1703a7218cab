use std::collections::HashSet;
use std::io::{self, Write};
use std::path::Path;

use super::bbox::BBox;
use super::record::{Annotation, AnnotationKind, LIVE_SOURCE};
use super::view;

pub const CSV_HEADER: &str =
    "Video,Timestamp,Taxon,Confidence,Type,Track_ID,x1,y1,x2,y2,Frame_Number,Photo";

/// Write the annotation report as CSV and return the number of rows.
///
/// Training records are left out, exact duplicates collapse to one row
/// and automatic records are reduced to the best one per track. `photo`
/// supplies the path of a saved still for a record, if any.
pub fn write_csv_report<'a, I, W, P>(records: I, mut writer: W, photo: P) -> io::Result<usize>
where
    I: IntoIterator<Item = &'a Annotation>,
    W: Write,
    P: Fn(&Annotation) -> Option<String>,
{
    let mut seen: HashSet<(&str, u64, &str, &str, BBox)> = HashSet::new();
    let unique = records
        .into_iter()
        .filter(|r| r.kind != AnnotationKind::Training)
        .filter(|r| {
            seen.insert((
                r.source_id.as_str(),
                r.frame_index,
                r.timestamp.as_str(),
                r.class_label.as_str(),
                r.bbox,
            ))
        });
    let mut rows = view::best_per_track(unique);
    view::sort_chronologically(&mut rows);

    writeln!(writer, "{CSV_HEADER}")?;
    for record in &rows {
        let track = record.track_id.map(|t| t.to_string()).unwrap_or_default();
        let photo = photo(record).unwrap_or_default();
        let fields = [
            video_name(&record.source_id),
            record.timestamp.clone(),
            record.class_label.clone(),
            format!("{:.2}", record.confidence),
            record.kind.as_str().to_string(),
            track,
            record.bbox.x1.to_string(),
            record.bbox.y1.to_string(),
            record.bbox.x2.to_string(),
            record.bbox.y2.to_string(),
            record.frame_index.to_string(),
            photo,
        ];
        let line: Vec<String> = fields.iter().map(|f| quote(f)).collect();
        writeln!(writer, "{}", line.join(","))?;
    }
    writer.flush()?;
    Ok(rows.len())
}

fn video_name(source_id: &str) -> String {
    if source_id == LIVE_SOURCE {
        return LIVE_SOURCE.to_string();
    }
    Path::new(source_id)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "Unknown".to_string())
}

fn quote(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationBuilder;

    fn record(kind: AnnotationKind, track: Option<u64>, conf: f32, frame: u64) -> Annotation {
        AnnotationBuilder::new()
            .kind(kind)
            .tlbr(1, 2, 30, 40)
            .frame_size(64, 64)
            .class("crab, red")
            .confidence(conf)
            .track_id(track)
            .frame(frame)
            .at_fps(1.0)
            .source("/data/reef.mp4")
            .build()
            .unwrap()
    }

    #[test]
    fn test_csv_report() {
        let records = vec![
            record(AnnotationKind::Automatic, Some(3), 0.5, 2),
            record(AnnotationKind::Automatic, Some(3), 0.8, 4),
            record(AnnotationKind::Manual, None, 1.0, 1),
            record(AnnotationKind::Manual, None, 1.0, 1),
            record(AnnotationKind::Training, None, 1.0, 5),
        ];
        let mut out = Vec::new();
        let rows = write_csv_report(&records, &mut out, |r| {
            (r.frame_index == 1).then(|| "frames/reef_frame_000001.jpg".to_string())
        })
        .unwrap();
        assert_eq!(rows, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            "reef.mp4,00:00:01,\"crab, red\",1.00,manual,,1,2,30,40,1,frames/reef_frame_000001.jpg"
        );
        assert_eq!(
            lines[2],
            "reef.mp4,00:00:04,\"crab, red\",0.80,auto,3,1,2,30,40,4,"
        );
    }

    #[test]
    fn test_video_name() {
        assert_eq!(video_name("Live"), "Live");
        assert_eq!(video_name("/a/b/c.mp4"), "c.mp4");
        assert_eq!(video_name(""), "Unknown");
    }
}
