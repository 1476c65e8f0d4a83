#![allow(dead_code)]

use anyhow::Result;
use std::fs;
use std::path::Path;

use club_network::Config;

pub const REGIONS: &str = "\
name,country,region_key,rank
London,UK,uk-london,1
Berlin,Germany,de-berlin,2
";

pub const CLUBS: &str = "\
id,img,name,address,rank,region_key,followers,capacity
c1,,Fabric,77a Charterhouse St,1,uk-london,5000,1500
c2,https://img.example/berghain.jpg,Berghain,Am Wriezener Bahnhof,2,de-berlin,9000,
c3,,Tresor,,3,de-berlin,,
";

pub const DATES: &str = "\
id,date,attending,name,img,club_id
e1,2019-03-01,100,Ben UFO all night,,c1
e2,2019-04-06,250,Klubnacht,,c2
e3,2019-05-17,80,Tresor presents,,c3
e4,2020-01-10,30,Fabric Saturday,,c1
e5,2020-02-14,40,Klubnacht,,c2
e6,2020-03-01,10,No details scraped,,c3
";

pub const DETAILS_2019: &str = r#"id,start_time,end_time,cost,age,promoters,flyers,artists,pick,attending
e1,23:00,07:00,£20,18,,,"[['benufo', 'Ben UFO'], ['marceldettmann', 'Marcel Dettmann']]",True,100
e2,00:00,12:00,€18,21,,,"[['marceldettmann', 'Marcel Dettmann'], ['benklock', 'Ben Klock']]",False,250
e3,23:59,08:00,,,,,"[['benklock', 'Ben Klock'], ['marceldettmann', 'Marcel Dettmann']]",,80
"#;

pub const DETAILS_2020: &str = r#"id,start_time,end_time,cost,age,promoters,flyers,artists,pick,attending
e4,23:00,06:00,£25,18,,,"[['benufo', 'Ben UFO']]",False,30
e5,00:00,12:00,€20,21,,,"[('dj-koze', 'DJ Koze')]",False,40
"#;

pub fn write_sources(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(dir.join("top-regions.csv"), REGIONS)?;
    fs::write(dir.join("top-clubs.csv"), CLUBS)?;
    fs::write(dir.join("top-clubs-dates.csv"), DATES)?;
    fs::write(dir.join("date-details-2019.csv"), DETAILS_2019)?;
    fs::write(dir.join("date-details-2020.csv"), DETAILS_2020)?;
    Ok(())
}

/// Config rooted entirely inside `root`
pub fn config_in(root: &Path) -> Config {
    let mut config = Config::default();
    config.input.data_dir = root.join("data");
    config.output.dir = root.join("public");
    config.cache.path = root.join("data").join("all-data.json");
    config
}
