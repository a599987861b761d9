//! 地理距离计算

/// 默认的“附近”判定阈值，单位英里
pub const DEFAULT_NEARBY_THRESHOLD_MILES: f64 = 5.0;

/// 计算两个经纬度坐标之间的球面距离，返回英里。
/// 采用球面余弦定理，入参为十进制度。
pub fn distance_miles(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64) -> f64 {
    let rad_theta = (lon_a - lon_b).to_radians();

    let mut dist = lat_a.to_radians().sin() * lat_b.to_radians().sin()
        + lat_a.to_radians().cos() * lat_b.to_radians().cos() * rad_theta.cos();

    // 同一点附近浮点可能略微越过 1，acos 会得到 NaN
    if dist > 1.0 {
        dist = 1.0;
    }

    dist.acos().to_degrees() * 60.0 * 1.1515
}

/// 两个坐标是否在 threshold 英里以内；恰好等于阈值也算附近
pub fn is_nearby(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64, threshold: f64) -> bool {
    distance_miles(lat_a, lon_a, lat_b, lon_b) <= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        assert_eq!(distance_miles(0.0, 0.0, 0.0, 0.0), 0.0);
        // 非零纬度下 sin²+cos² 可能略小于 1，只保证亚米级的零
        assert!(distance_miles(39.9, 116.4, 39.9, 116.4) < 1e-3);
        assert!(distance_miles(31.2, 121.5, 31.2, 121.5) < 1e-3);
    }

    #[test]
    fn distance_is_symmetric() {
        let d1 = distance_miles(39.9, 116.4, 31.2, 121.5);
        let d2 = distance_miles(31.2, 121.5, 39.9, 116.4);
        assert_eq!(d1, d2);
    }

    #[test]
    fn small_longitude_offset_is_nearby() {
        // 赤道上经度差 0.05 度约 3.45 英里
        let d = distance_miles(0.0, 0.0, 0.0, 0.05);
        assert!((d - 3.45).abs() < 0.05, "unexpected distance {d}");
        assert!(is_nearby(0.0, 0.0, 0.0, 0.05, DEFAULT_NEARBY_THRESHOLD_MILES));
    }

    #[test]
    fn ten_degrees_apart_is_not_nearby() {
        let d = distance_miles(0.0, 0.0, 0.0, 10.0);
        assert!(d > 600.0, "unexpected distance {d}");
        assert!(!is_nearby(0.0, 0.0, 0.0, 10.0, DEFAULT_NEARBY_THRESHOLD_MILES));
    }

    #[test]
    fn exactly_at_threshold_counts_as_nearby() {
        let d = distance_miles(0.0, 0.0, 0.0, 0.05);
        assert!(is_nearby(0.0, 0.0, 0.0, 0.05, d));
    }
}
