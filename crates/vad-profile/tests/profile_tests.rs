//! Tests for assembling, writing and reading VAD profiles.

use std::path::PathBuf;

use chrono::Duration;
use radar_scan::nc::{get_f64_attr, get_str_attr};
use radar_scan::{CfRadialReader, Platform};
use test_utils::{
    assert_approx_eq, sample_time, temp_test_dir, touch_files, CfRadialVolume, SyntheticReader, SyntheticScan,
    SGP_I5,
};
use vad_common::time::base_time_string;
use vad_common::{HeightGrid, SiteRegistry, VadError};
use vad_profile::encoder::{EPOCH_UNITS, PROVENANCE_ATTRIBUTES};
use vad_profile::{
    read_profile, AssemblerOptions, ProfileAssembler, ProfileEncoder, ProfileRecord, Provenance, FILL_VALUE,
};

const SITE: &str = "xsaprvadI5";

fn registry() -> SiteRegistry {
    SiteRegistry::builtin().unwrap()
}

fn assemble_synthetic(count: usize) -> ProfileRecord {
    let dir = PathBuf::from("/data/xsapr");
    let (reader, paths) = SyntheticReader::time_series(&dir, sample_time(0, 5), count, 15);
    ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&paths)
        .unwrap()
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn test_skips_unreadable_scans_in_order() {
    // Scans 2 and 4 of 5 are not radar files
    let reader = SyntheticReader::new()
        .with_scan("scan_1.nc", SyntheticScan::new(sample_time(1, 0)).with_wind(1.0, 0.0))
        .with_scan("scan_3.nc", SyntheticScan::new(sample_time(3, 0)).with_wind(3.0, 0.0))
        .with_scan("scan_5.nc", SyntheticScan::new(sample_time(5, 0)).with_wind(5.0, 0.0));
    let paths = ["scan_5.nc", "scan_4.nc", "scan_3.nc", "scan_2.nc", "scan_1.nc"];

    let record = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&paths)
        .unwrap();

    assert_eq!(record.n_times(), 3);
    assert_eq!(
        record.times(),
        &[sample_time(1, 0), sample_time(3, 0), sample_time(5, 0)]
    );
    assert_eq!(record.u_wind().get(0, 0), Some(1.0));
    assert_eq!(record.u_wind().get(1, 0), Some(3.0));
    assert_eq!(record.u_wind().get(2, 0), Some(5.0));
}

#[test]
fn test_all_unreadable_is_an_error() {
    let assembler = ProfileAssembler::new(SyntheticReader::new(), AssemblerOptions::default());
    let err = assembler.assemble(&["a.nc", "b.nc", "c.nc"]).unwrap_err();
    assert!(matches!(err, VadError::NoUsableScans { attempted: 3 }), "{}", err);
}

#[test]
fn test_empty_input_is_an_error() {
    let assembler = ProfileAssembler::new(SyntheticReader::new(), AssemblerOptions::default());
    let paths: [&str; 0] = [];
    assert!(matches!(
        assembler.assemble(&paths),
        Err(VadError::NoUsableScans { attempted: 0 })
    ));
}

#[test]
fn test_corrupt_scan_aborts_the_run() {
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(sample_time(1, 0)))
        .with_corrupt("b.nc", "truncated sweep table");
    let err = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&["a.nc", "b.nc"])
        .unwrap_err();
    assert!(matches!(err, VadError::Scan { .. }), "{}", err);
}

#[test]
fn test_parallel_matches_sequential() {
    let dir = PathBuf::from("/data/xsapr");
    let (reader, mut paths) = SyntheticReader::time_series(&dir, sample_time(0, 0), 24, 30);
    paths.reverse();

    let sequential = ProfileAssembler::new(reader.clone(), AssemblerOptions::default())
        .assemble(&paths)
        .unwrap();
    let parallel = ProfileAssembler::new(
        reader,
        AssemblerOptions {
            parallel: true,
            ..AssemblerOptions::default()
        },
    )
    .assemble(&paths)
    .unwrap();

    assert_eq!(sequential, parallel);
}

#[test]
fn test_custom_grid() {
    let reader = SyntheticReader::new().with_scan("a.nc", SyntheticScan::new(sample_time(1, 0)));
    let options = AssemblerOptions {
        grid: HeightGrid::parse_spec("0:5000:11").unwrap(),
        ..AssemblerOptions::default()
    };
    let record = ProfileAssembler::new(reader, options).assemble(&["a.nc"]).unwrap();
    assert_eq!(record.shape(), (1, 11));
}

#[test]
fn test_first_scan_platform_is_kept() {
    let moved = Platform {
        altitude: 300.0,
        longitude: -97.363,
        latitude: 36.431,
    };
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(sample_time(1, 0)))
        .with_scan("b.nc", SyntheticScan::new(sample_time(2, 0)).with_platform(moved));

    let record = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&["b.nc", "a.nc"])
        .unwrap();

    assert_eq!(record.n_times(), 2);
    assert_eq!(record.platform(), SGP_I5);
}

// ============================================================================
// Encoding
// ============================================================================

#[test]
fn test_written_shapes() {
    let registry = registry();
    let record = assemble_synthetic(7);
    let dir = temp_test_dir();

    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();
    let profile = read_profile(&path).unwrap();

    assert_eq!(profile.times.len(), 7);
    assert_eq!(profile.heights.len(), 101);
    for field in [&profile.u_wind, &profile.v_wind, &profile.speed, &profile.direction] {
        assert_eq!(field.shape(), (7, 101));
    }
    assert_eq!(profile.times, record.times());
}

#[test]
fn test_single_scan_keeps_time_axis() {
    let registry = registry();
    let record = assemble_synthetic(1);
    let dir = temp_test_dir();

    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();
    let profile = read_profile(&path).unwrap();

    assert_eq!(profile.times.len(), 1);
    assert_eq!(profile.u_wind.shape(), (1, 101));
    assert_eq!(profile.direction.shape(), (1, 101));
}

#[test]
fn test_filename_and_metadata() {
    let registry = registry();
    let record = assemble_synthetic(3);
    let dir = temp_test_dir();

    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "sgpxsaprvadI5.c1.20171005.000000.nc"
    );

    let profile = read_profile(&path).unwrap();
    assert_eq!(profile.attribute("datastream"), Some("sgpxsaprvadI5.c1"));
    assert_eq!(profile.attribute("facility_id"), Some("I5 : Garber, OK"));
    assert_eq!(
        profile.attribute("location_description"),
        Some("Southern Great Plains (SGP), Garber, Oklahoma")
    );
    for key in PROVENANCE_ATTRIBUTES {
        assert!(profile.attribute(key).is_some(), "missing {}", key);
    }

    let platform = profile.platform.unwrap();
    assert_approx_eq!(platform.latitude, record.platform().latitude, 1e-9);
    assert_approx_eq!(platform.longitude, record.platform().longitude, 1e-9);
    assert_approx_eq!(platform.altitude, record.platform().altitude, 1e-9);
}

#[test]
fn test_same_site_and_date_share_a_filename() {
    let registry = registry();
    let encoder = ProfileEncoder::new(&registry);
    let dir = PathBuf::from("/out");

    let morning = ProfileAssembler::new(
        SyntheticReader::new().with_scan("a.nc", SyntheticScan::new(sample_time(0, 10))),
        AssemblerOptions::default(),
    )
    .assemble(&["a.nc"])
    .unwrap();
    let evening = ProfileAssembler::new(
        SyntheticReader::new().with_scan("b.nc", SyntheticScan::new(sample_time(22, 40))),
        AssemblerOptions::default(),
    )
    .assemble(&["b.nc"])
    .unwrap();

    assert_eq!(
        encoder.output_path(&morning, SITE, &dir).unwrap(),
        encoder.output_path(&evening, SITE, &dir).unwrap()
    );
}

#[test]
fn test_rewrite_overwrites() {
    let registry = registry();
    let encoder = ProfileEncoder::new(&registry);
    let dir = temp_test_dir();

    let first = encoder
        .write(&assemble_synthetic(2), SITE, dir.path(), &Provenance::capture())
        .unwrap();
    let second = encoder
        .write(&assemble_synthetic(5), SITE, dir.path(), &Provenance::capture())
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(read_profile(&second).unwrap().times.len(), 5);
}

#[test]
fn test_unregistered_site_writes_nothing() {
    let registry = registry();
    let record = assemble_synthetic(2);
    let dir = temp_test_dir();
    let out = dir.path().join("out");

    let err = ProfileEncoder::new(&registry)
        .write(&record, "xsaprvadI9", &out, &Provenance::capture())
        .unwrap_err();

    assert!(matches!(err, VadError::UnknownSite(ref s) if s == "xsaprvadI9"));
    assert!(!out.exists());
}

#[test]
fn test_encoding_is_idempotent_across_directories() {
    let registry = registry();
    let encoder = ProfileEncoder::new(&registry);
    let record = assemble_synthetic(6);
    let dir_a = temp_test_dir();
    let dir_b = temp_test_dir();

    let a = read_profile(&encoder.write(&record, SITE, dir_a.path(), &Provenance::capture()).unwrap()).unwrap();
    let b = read_profile(&encoder.write(&record, SITE, dir_b.path(), &Provenance::capture()).unwrap()).unwrap();

    assert_eq!(a.times, b.times);
    assert_eq!(a.heights, b.heights);
    assert_eq!(a.u_wind, b.u_wind);
    assert_eq!(a.v_wind, b.v_wind);
    assert_eq!(a.speed, b.speed);
    assert_eq!(a.direction, b.direction);
    assert_eq!(a.platform, b.platform);

    let strip = |attrs: &std::collections::BTreeMap<String, String>| {
        attrs
            .iter()
            .filter(|(k, _)| !PROVENANCE_ATTRIBUTES.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<Vec<_>>()
    };
    assert_eq!(strip(&a.attributes), strip(&b.attributes));
}

#[test]
fn test_fractional_scan_times_round_trip() {
    let registry = registry();
    let first = sample_time(15, 0) + Duration::milliseconds(700);
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(first))
        .with_scan("b.nc", SyntheticScan::new(first + Duration::minutes(10)));
    let record = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&["a.nc", "b.nc"])
        .unwrap();
    let dir = temp_test_dir();

    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();

    let file = netcdf::open(&path).unwrap();
    let base: Vec<i64> = file.variable("base_time").unwrap().get_values(..).unwrap();
    assert_eq!(base, vec![sample_time(15, 0).timestamp()]);
    let offsets: Vec<f64> = file.variable("time_offset").unwrap().get_values(..).unwrap();
    assert_approx_eq!(offsets[0], 0.7, 1e-9);
    assert_approx_eq!(offsets[1], 600.7, 1e-9);

    let profile = read_profile(&path).unwrap();
    assert_eq!(profile.times, record.times());
}

#[test]
fn test_written_attribute_schema() {
    let registry = registry();
    let record = assemble_synthetic(3);
    let dir = temp_test_dir();

    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();
    let file = netcdf::open(&path).unwrap();
    let var = |name: &str| file.variable(name).unwrap();

    assert!(file.dimension("time").unwrap().is_unlimited());
    assert!(!file.dimension("height").unwrap().is_unlimited());

    // Base time
    let base_time = var("base_time");
    let epoch: Vec<i64> = base_time.get_values(..).unwrap();
    assert_eq!(epoch, vec![sample_time(0, 5).timestamp()]);
    assert_eq!(
        get_str_attr(&base_time, "string").as_deref(),
        Some(base_time_string(&sample_time(0, 5)).as_str())
    );
    assert_eq!(get_str_attr(&base_time, "units").as_deref(), Some(EPOCH_UNITS));

    // Time axes share units but carry distinct labels
    for name in ["time", "time_offset"] {
        assert_eq!(
            get_str_attr(&var(name), "units").as_deref(),
            Some("seconds since 2017-10-05 00:05:00 0:00"),
            "{}",
            name
        );
    }
    assert_eq!(get_str_attr(&var("time"), "long_name").as_deref(), Some("Scan start time"));
    assert_ne!(
        get_str_attr(&var("time"), "long_name"),
        get_str_attr(&var("time_offset"), "long_name")
    );

    assert_eq!(get_str_attr(&var("height"), "units").as_deref(), Some("meter"));

    // Wind fields
    for name in ["u_wind", "v_wind", "speed"] {
        assert_eq!(get_str_attr(&var(name), "units").as_deref(), Some("m/s"), "{}", name);
    }
    let direction = var("direction");
    assert_eq!(get_str_attr(&direction, "units").as_deref(), Some("degree"));
    assert_eq!(
        get_str_attr(&direction, "standard_name").as_deref(),
        Some("wind_from_direction")
    );
    for name in ["u_wind", "v_wind", "speed", "direction"] {
        assert_eq!(get_f64_attr(&var(name), "_FillValue"), Some(FILL_VALUE), "{}", name);
    }

    // Location scalars
    let lon = var("lon");
    assert_eq!(get_f64_attr(&lon, "valid_min"), Some(-180.0));
    assert_eq!(get_f64_attr(&lon, "valid_max"), Some(180.0));
    let lat = var("lat");
    assert_eq!(get_f64_attr(&lat, "valid_min"), Some(-90.0));
    assert_eq!(get_f64_attr(&lat, "valid_max"), Some(90.0));
    assert_eq!(get_str_attr(&var("alt"), "units").as_deref(), Some("m"));
}

#[test]
fn test_missing_levels_round_trip_as_fill() {
    let registry = registry();
    let reader = SyntheticReader::new().with_scan(
        "a.nc",
        SyntheticScan::new(sample_time(4, 0)).with_wind(f64::NAN, f64::NAN),
    );
    let record = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(&["a.nc"])
        .unwrap();
    let dir = temp_test_dir();
    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, dir.path(), &Provenance::capture())
        .unwrap();

    // Raw values on disk are the fill value
    let file = netcdf::open(&path).unwrap();
    let raw: Vec<f64> = file.variable("speed").unwrap().get_values(..).unwrap();
    assert!(raw.iter().all(|&v| v == FILL_VALUE));

    // The reader maps them back to NaN
    let profile = read_profile(&path).unwrap();
    assert!(profile.speed.values().iter().all(|v| v.is_nan()));
}

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_read_rejects_file_without_wind() {
    let dir = temp_test_dir();
    let path = dir.path().join("partial.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_dimension("height", 2).unwrap();
        let mut var = file.add_variable::<f64>("height", &["height"]).unwrap();
        var.put_values(&[0.0, 100.0], ..).unwrap();
    }

    let err = read_profile(&path).unwrap_err();
    assert!(
        matches!(err, VadError::MissingVariable { ref name, .. } if name == "u_wind"),
        "{}",
        err
    );
}

// ============================================================================
// End to end with CfRadial volumes
// ============================================================================

#[test]
fn test_cfradial_pipeline() {
    let input = temp_test_dir();
    let output = temp_test_dir();

    for (i, minute) in [0u32, 10, 20].into_iter().enumerate() {
        CfRadialVolume::new(sample_time(15, minute), 4.0 + i as f64, -6.0)
            .write(&input.path().join(format!("cfrad.20171005_15{:02}00.nc", minute)))
            .unwrap();
    }
    // A stray non-radar file in the input set is skipped
    let mut paths = touch_files(input.path(), &["cfrad.20171005_150500.nc"]);
    paths.extend(
        [0u32, 10, 20]
            .iter()
            .map(|m| input.path().join(format!("cfrad.20171005_15{:02}00.nc", m))),
    );

    let options = AssemblerOptions {
        grid: HeightGrid::linspace(500.0, 2500.0, 5).unwrap(),
        ..AssemblerOptions::default()
    };
    let record = ProfileAssembler::new(CfRadialReader::new(), options)
        .assemble(&paths)
        .unwrap();
    assert_eq!(record.shape(), (3, 5));
    assert_eq!(record.base_time(), sample_time(15, 0));

    let registry = registry();
    let path = ProfileEncoder::new(&registry)
        .write(&record, SITE, output.path(), &Provenance::capture())
        .unwrap();
    let profile = read_profile(&path).unwrap();

    for (t, expected_u) in [4.0, 5.0, 6.0].into_iter().enumerate() {
        for h in 0..5 {
            assert_approx_eq!(profile.u_wind.get(t, h).unwrap(), expected_u, 1e-3);
            assert_approx_eq!(profile.v_wind.get(t, h).unwrap(), -6.0, 1e-3);
        }
    }
}
