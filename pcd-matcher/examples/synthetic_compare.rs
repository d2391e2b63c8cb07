use std::io::Cursor;

use pcd_core::pointcloud::point::CloudPoint;
use pcd_core::survey::SurveyPoint;
use pcd_matcher::{compare, MatchConfig};
use pcd_parser::reader::las::{read_header, LasBuilder, LasChunkReader};

// Builds a 100 x 100 terrain grid in memory and compares a few survey points against it.
fn main() {
    let mut points = Vec::new();
    for i in 0..100u64 {
        for j in 0..100u64 {
            let x = i as f64 * 0.1;
            let y = j as f64 * 0.1;
            points.push(CloudPoint {
                index: i * 100 + j,
                x,
                y,
                z: 10.0 + 0.05 * x,
                classification: if (i + j) % 7 == 0 { 5 } else { 2 },
            });
        }
    }
    let bytes = LasBuilder::new([0.001; 3], [0.0; 3]).build(&points).unwrap();

    let survey = vec![
        SurveyPoint { id: 0, x: 1.02, y: 2.03, z: 10.1 },
        SurveyPoint { id: 1, x: 5.55, y: 5.55, z: 10.5 },
        SurveyPoint { id: 2, x: 50.0, y: 50.0, z: 0.0 },
    ];

    let mut cursor = Cursor::new(bytes);
    let header = read_header(&mut cursor).unwrap();
    let config = MatchConfig {
        max_chunk_points: 1_000,
        ..MatchConfig::default()
    };
    let comparison = compare(survey, header, LasChunkReader::new(cursor), &config).unwrap();

    println!("{:?}", comparison.stats);
    for (point, result) in comparison.rows() {
        match result.best {
            Some(best) => println!(
                "survey {}: cloud ({}, {}, {}) at {:.3}, dz {:.3}",
                point.id,
                best.x,
                best.y,
                best.z,
                result.best_distance,
                point.z - best.z
            ),
            None => println!("survey {}: not found", point.id),
        }
    }
}
