//! Tests for daily quicklook rendering.

use chrono::Duration;
use std::path::{Path, PathBuf};

use renderer::quicklook::{quicklook_title, render_quicklook, subsample, QuicklookOptions};
use test_utils::{assert_approx_eq, sample_time, temp_test_dir, SyntheticReader, SyntheticScan};
use vad_common::time::day_window;
use vad_common::{SiteRegistry, VadError};
use vad_profile::{read_profile, AssemblerOptions, ProfileAssembler, ProfileEncoder, Provenance};

const SITE: &str = "xsaprvadI5";
const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

fn registry() -> SiteRegistry {
    SiteRegistry::builtin().unwrap()
}

/// Assemble and write a profile from `reader`, returning the NetCDF path.
fn write_profile(reader: SyntheticReader, paths: &[PathBuf], dir: &Path) -> PathBuf {
    let record = ProfileAssembler::new(reader, AssemblerOptions::default())
        .assemble(paths)
        .unwrap();
    let registry = registry();
    ProfileEncoder::new(&registry)
        .write(&record, SITE, dir, &Provenance::capture())
        .unwrap()
}

/// Thirteen scans every 15 minutes from 00:05.
fn series_profile(dir: &Path) -> PathBuf {
    let (reader, paths) = SyntheticReader::time_series(Path::new("/data/xsapr"), sample_time(0, 5), 13, 15);
    write_profile(reader, &paths, dir)
}

fn png_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().map_or(false, |ext| ext == "png"))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Subsampling
// ============================================================================

#[test]
fn test_subsample_strides() {
    let dir = temp_test_dir();
    let profile = read_profile(&series_profile(dir.path())).unwrap();
    let (start, _) = day_window(&profile.first_time().unwrap());

    let samples = subsample(&profile, &start, &QuicklookOptions::default());

    // Times 0, 6, 12 of 13 and levels 0, 5, ..., 100 of 101
    assert_eq!(samples.len(), 3 * 21);
    assert_approx_eq!(samples[0].hour, 5.0 / 60.0, 1e-9);
    assert_approx_eq!(samples[21].hour, (5.0 + 6.0 * 15.0) / 60.0, 1e-9);
    assert_approx_eq!(samples[1].height_km, 0.5, 1e-9);
    assert_approx_eq!(samples[20].height_km, 10.0, 1e-9);
}

#[test]
fn test_subsample_converts_to_knots() {
    let dir = temp_test_dir();
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(sample_time(12, 0)).with_wind(0.0, 10.28888));
    let profile = read_profile(&write_profile(reader, &[PathBuf::from("a.nc")], dir.path())).unwrap();
    let (start, _) = day_window(&profile.first_time().unwrap());

    let samples = subsample(&profile, &start, &QuicklookOptions::default());
    assert!(!samples.is_empty());
    for sample in &samples {
        assert_approx_eq!(sample.speed_kt, 20.0, 1e-6);
        assert_approx_eq!(sample.v_kt, 20.0, 1e-6);
        assert_approx_eq!(sample.u_kt, 0.0, 1e-9);
        assert_approx_eq!(sample.hour, 12.0, 1e-9);
    }
}

#[test]
fn test_subsample_clips_to_first_day() {
    let dir = temp_test_dir();
    let late = sample_time(23, 50);
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(late).with_wind(5.0, 5.0))
        .with_scan("b.nc", SyntheticScan::new(late + Duration::minutes(20)).with_wind(5.0, 5.0));
    let paths = [PathBuf::from("a.nc"), PathBuf::from("b.nc")];
    let profile = read_profile(&write_profile(reader, &paths, dir.path())).unwrap();
    let (start, _) = day_window(&profile.first_time().unwrap());

    let options = QuicklookOptions {
        time_stride: 1,
        ..QuicklookOptions::default()
    };
    let samples = subsample(&profile, &start, &options);

    // The scan after midnight falls outside the window
    assert_eq!(samples.len(), 21);
    assert!(samples.iter().all(|s| s.hour < 24.0));
}

#[test]
fn test_subsample_skips_missing_winds() {
    let dir = temp_test_dir();
    let reader = SyntheticReader::new()
        .with_scan("a.nc", SyntheticScan::new(sample_time(6, 0)).with_wind(f64::NAN, 3.0));
    let profile = read_profile(&write_profile(reader, &[PathBuf::from("a.nc")], dir.path())).unwrap();
    let (start, _) = day_window(&profile.first_time().unwrap());

    assert!(subsample(&profile, &start, &QuicklookOptions::default()).is_empty());
}

#[test]
fn test_title_uses_day_window() {
    let (start, end) = day_window(&sample_time(17, 42));
    assert_eq!(
        quicklook_title("SGP X-SAPR I5 VAD Profile ", &start, &end),
        "SGP X-SAPR I5 VAD Profile 2017-10-05 00:00:00 - 2017-10-06 00:00:00"
    );
}

// ============================================================================
// Rendering
// ============================================================================

#[test]
fn test_render_writes_png() {
    let dir = temp_test_dir();
    let profile = series_profile(dir.path());
    let out = dir.path().join("quicklooks");

    let path = render_quicklook(&profile, SITE, &registry(), &out, &QuicklookOptions::default()).unwrap();

    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "sgpxsaprvadI5.c1.20171005.000000.png"
    );
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(&bytes[0..8], &PNG_SIGNATURE);
    // IHDR width and height
    assert_eq!(u32::from_be_bytes([bytes[16], bytes[17], bytes[18], bytes[19]]), 1200);
    assert_eq!(u32::from_be_bytes([bytes[20], bytes[21], bytes[22], bytes[23]]), 600);
}

#[test]
fn test_same_date_overwrites() {
    let dir = temp_test_dir();
    let out = dir.path().join("quicklooks");

    let first_dir = dir.path().join("morning");
    let reader = SyntheticReader::new().with_scan("a.nc", SyntheticScan::new(sample_time(1, 0)));
    let morning = write_profile(reader, &[PathBuf::from("a.nc")], &first_dir);

    let second_dir = dir.path().join("evening");
    let reader = SyntheticReader::new().with_scan("b.nc", SyntheticScan::new(sample_time(20, 30)));
    let evening = write_profile(reader, &[PathBuf::from("b.nc")], &second_dir);

    let options = QuicklookOptions::default();
    let a = render_quicklook(&morning, SITE, &registry(), &out, &options).unwrap();
    let b = render_quicklook(&evening, SITE, &registry(), &out, &options).unwrap();

    assert_eq!(a, b);
    assert_eq!(png_files(&out).len(), 1);
}

#[test]
fn test_unknown_site_writes_nothing() {
    let dir = temp_test_dir();
    let profile = series_profile(dir.path());
    let out = dir.path().join("quicklooks");

    let err = render_quicklook(&profile, "xsaprvadI9", &registry(), &out, &QuicklookOptions::default())
        .unwrap_err();

    assert!(matches!(err, VadError::UnknownSite(ref s) if s == "xsaprvadI9"), "{}", err);
    assert!(png_files(&out).is_empty());
}

#[test]
fn test_missing_variable_writes_nothing() {
    let dir = temp_test_dir();
    let path = dir.path().join("partial.nc");
    {
        let mut file = netcdf::create(&path).unwrap();
        file.add_unlimited_dimension("time").unwrap();
        file.add_dimension("height", 3).unwrap();
        let mut time = file.add_variable::<f64>("time", &["time"]).unwrap();
        time.put_attribute("units", "seconds since 2017-10-05 00:00:00 0:00").unwrap();
        time.put_values(&[0.0], (&[0usize], &[1usize])).unwrap();
        let mut height = file.add_variable::<f64>("height", &["height"]).unwrap();
        height.put_values(&[0.0, 100.0, 200.0], ..).unwrap();
        let mut speed = file.add_variable::<f64>("speed", &["time", "height"]).unwrap();
        speed.put_values(&[1.0, 2.0, 3.0], (&[0usize, 0], &[1usize, 3])).unwrap();
    }
    let out = dir.path().join("quicklooks");

    let err = render_quicklook(&path, SITE, &registry(), &out, &QuicklookOptions::default()).unwrap_err();

    assert!(
        matches!(err, VadError::MissingVariable { ref name, .. } if name == "u_wind"),
        "{}",
        err
    );
    assert!(png_files(&out).is_empty());
}

#[test]
fn test_missing_profile_file_is_an_error() {
    let dir = temp_test_dir();
    let out = dir.path().join("quicklooks");
    let result = render_quicklook(
        &dir.path().join("nope.nc"),
        SITE,
        &registry(),
        &out,
        &QuicklookOptions::default(),
    );
    assert!(matches!(result, Err(VadError::NetCdf(_))));
    assert!(png_files(&out).is_empty());
}
