#![allow(dead_code)]

use std::fs;
use std::path::Path;

// 2023-06-12 is a Monday. WD runs Monday to Friday except 2023-06-14,
// WE runs on the weekend.
const STOPS: &str = "\u{feff}stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station
S,Central,47.3779,8.5403,1,
A,Central Platform 1,47.3780,8.5400,0,S
B,Bellevue,47.3667,8.5450,,
C,Stadelhofen,47.3667,8.5483,0,
";

const ROUTES: &str = "route_id,agency_id,route_short_name,route_long_name,route_type
R1,ZVV,31,,3
R2,ZVV,,Tram Line,0
";

const TRIPS: &str = "route_id,service_id,trip_id,shape_id
R1,WD,t1,shp1
R1,WD,t2,shp1
R1,WE,w1,shp1
R2,WD,t3,
R2,WD,f1,shp2
";

const STOP_TIMES: &str = "trip_id,arrival_time,departure_time,stop_id,stop_sequence
t1,08:00:00,08:00:00,A,1
t1,08:05:00,08:05:30,B,2
t1,08:10:00,08:10:00,C,3
t2,08:30:00,08:30:00,A,1
t2,08:35:00,08:35:30,B,2
t2,08:40:00,08:40:00,C,3
w1,9:00:00,9:00:00,A,1
w1,09:05:00,09:05:30,B,2
w1,09:10:00,09:10:00,C,3
t3,25:00:00,25:00:00,C,2
t3,24:50:00,24:50:00,A,1
f1,06:00:00,06:00:00,B,1
f1,06:10:00,06:10:00,C,2
";

const FREQUENCIES: &str = "trip_id,start_time,end_time,headway_secs
f1,06:00:00,07:00:00,1200
";

const CALENDAR: &str =
    "service_id,monday,tuesday,wednesday,thursday,friday,saturday,sunday,start_date,end_date
WD,1,1,1,1,1,0,0,20230612,20230618
WE,0,0,0,0,0,1,1,20230612,20230618
";

const CALENDAR_DATES: &str = "service_id,date,exception_type
WD,20230614,2
";

/// Writes a small two-line feed into `dir`.
pub fn write_feed(dir: &Path) {
    fs::write(dir.join("stops.txt"), STOPS).unwrap();
    fs::write(dir.join("routes.txt"), ROUTES).unwrap();
    fs::write(dir.join("trips.txt"), TRIPS).unwrap();
    fs::write(dir.join("stop_times.txt"), STOP_TIMES).unwrap();
    fs::write(dir.join("frequencies.txt"), FREQUENCIES).unwrap();
    fs::write(dir.join("calendar.txt"), CALENDAR).unwrap();
    fs::write(dir.join("calendar_dates.txt"), CALENDAR_DATES).unwrap();
}
